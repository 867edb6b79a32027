//! 3x5 pixel font for scrolling text on the 8x8 matrix.

pub const GLYPH_WIDTH: usize = 3;
pub const GLYPH_HEIGHT: usize = 5;

// Rows top to bottom, bit 2 is the leftmost column.
const GLYPHS: &[(char, [u8; GLYPH_HEIGHT])] = &[
    (' ', [0b000, 0b000, 0b000, 0b000, 0b000]),
    ('0', [0b111, 0b101, 0b101, 0b101, 0b111]),
    ('1', [0b010, 0b110, 0b010, 0b010, 0b111]),
    ('2', [0b111, 0b001, 0b111, 0b100, 0b111]),
    ('3', [0b111, 0b001, 0b111, 0b001, 0b111]),
    ('4', [0b101, 0b101, 0b111, 0b001, 0b001]),
    ('5', [0b111, 0b100, 0b111, 0b001, 0b111]),
    ('6', [0b111, 0b100, 0b111, 0b101, 0b111]),
    ('7', [0b111, 0b001, 0b001, 0b001, 0b001]),
    ('8', [0b111, 0b101, 0b111, 0b101, 0b111]),
    ('9', [0b111, 0b101, 0b111, 0b001, 0b111]),
    ('A', [0b010, 0b101, 0b111, 0b101, 0b101]),
    ('B', [0b110, 0b101, 0b110, 0b101, 0b110]),
    ('C', [0b011, 0b100, 0b100, 0b100, 0b011]),
    ('D', [0b110, 0b101, 0b101, 0b101, 0b110]),
    ('E', [0b111, 0b100, 0b110, 0b100, 0b111]),
    ('F', [0b111, 0b100, 0b110, 0b100, 0b100]),
    ('G', [0b011, 0b100, 0b101, 0b101, 0b011]),
    ('H', [0b101, 0b101, 0b111, 0b101, 0b101]),
    ('I', [0b111, 0b010, 0b010, 0b010, 0b111]),
    ('J', [0b001, 0b001, 0b001, 0b101, 0b010]),
    ('K', [0b101, 0b101, 0b110, 0b101, 0b101]),
    ('L', [0b100, 0b100, 0b100, 0b100, 0b111]),
    ('M', [0b101, 0b111, 0b111, 0b101, 0b101]),
    ('N', [0b110, 0b101, 0b101, 0b101, 0b101]),
    ('O', [0b010, 0b101, 0b101, 0b101, 0b010]),
    ('P', [0b110, 0b101, 0b110, 0b100, 0b100]),
    ('Q', [0b010, 0b101, 0b101, 0b111, 0b011]),
    ('R', [0b110, 0b101, 0b110, 0b101, 0b101]),
    ('S', [0b011, 0b100, 0b010, 0b001, 0b110]),
    ('T', [0b111, 0b010, 0b010, 0b010, 0b010]),
    ('U', [0b101, 0b101, 0b101, 0b101, 0b111]),
    ('V', [0b101, 0b101, 0b101, 0b101, 0b010]),
    ('W', [0b101, 0b101, 0b111, 0b111, 0b101]),
    ('X', [0b101, 0b101, 0b010, 0b101, 0b101]),
    ('Y', [0b101, 0b101, 0b010, 0b010, 0b010]),
    ('Z', [0b111, 0b001, 0b010, 0b100, 0b111]),
    ('.', [0b000, 0b000, 0b000, 0b000, 0b010]),
    (',', [0b000, 0b000, 0b000, 0b010, 0b100]),
    (':', [0b000, 0b010, 0b000, 0b010, 0b000]),
    ('%', [0b101, 0b001, 0b010, 0b100, 0b101]),
    ('-', [0b000, 0b000, 0b111, 0b000, 0b000]),
    ('+', [0b000, 0b010, 0b111, 0b010, 0b000]),
    ('=', [0b000, 0b111, 0b000, 0b111, 0b000]),
    ('\'', [0b010, 0b010, 0b000, 0b000, 0b000]),
    ('!', [0b010, 0b010, 0b010, 0b000, 0b010]),
    ('?', [0b111, 0b001, 0b010, 0b000, 0b010]),
    ('/', [0b001, 0b001, 0b010, 0b100, 0b100]),
    ('(', [0b001, 0b010, 0b010, 0b010, 0b001]),
    (')', [0b100, 0b010, 0b010, 0b010, 0b100]),
];

/// Glyph rows for `ch`; lowercase folds to uppercase, unknown characters render as '?'.
pub fn glyph(ch: char) -> [u8; GLYPH_HEIGHT] {
    let upper = ch.to_ascii_uppercase();
    lookup(upper)
        .or_else(|| lookup('?'))
        .unwrap_or([0; GLYPH_HEIGHT])
}

fn lookup(ch: char) -> Option<[u8; GLYPH_HEIGHT]> {
    GLYPHS.iter().find(|(c, _)| *c == ch).map(|(_, rows)| *rows)
}

/// Render text into lit/unlit columns (one spacer column after each glyph).
pub fn render_columns(text: &str) -> Vec<[bool; GLYPH_HEIGHT]> {
    let mut columns = Vec::with_capacity(text.chars().count() * (GLYPH_WIDTH + 1));
    for ch in text.chars() {
        let rows = glyph(ch);
        for col in 0..GLYPH_WIDTH {
            let mask = 1 << (GLYPH_WIDTH - 1 - col);
            let mut column = [false; GLYPH_HEIGHT];
            for (row, bits) in rows.iter().enumerate() {
                column[row] = bits & mask != 0;
            }
            columns.push(column);
        }
        columns.push([false; GLYPH_HEIGHT]);
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_folds_and_unknown_falls_back() {
        assert_eq!(glyph('a'), glyph('A'));
        assert_eq!(glyph('~'), glyph('?'));
    }

    #[test]
    fn renders_four_columns_per_char() {
        let cols = render_columns("T1");
        assert_eq!(cols.len(), 8);
        // 'T' top row is fully lit
        assert!(cols[0][0] && cols[1][0] && cols[2][0]);
        // spacer
        assert_eq!(cols[3], [false; GLYPH_HEIGHT]);
    }
}
