use std::collections::VecDeque;

pub const WINDOW_LEN: usize = 3;

/// Rolling mean over the last three corrected temperatures.
///
/// The window is either empty or full: the first sample is replicated so the
/// mean starts at that sample instead of being dragged toward zero.
#[derive(Debug, Clone, Default)]
pub struct SmoothingWindow {
    values: VecDeque<f64>,
}

impl SmoothingWindow {
    pub fn new() -> Self {
        Self {
            values: VecDeque::with_capacity(WINDOW_LEN),
        }
    }

    pub fn push(&mut self, value: f64) -> f64 {
        if self.values.is_empty() {
            self.values.extend([value; WINDOW_LEN]);
        } else {
            self.values.pop_front();
            self.values.push_back(value);
        }
        self.values.iter().sum::<f64>() / WINDOW_LEN as f64
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Oldest first.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_push_returns_value() {
        let mut window = SmoothingWindow::new();
        assert!(window.is_empty());
        assert_eq!(window.push(12.5), 12.5);
        assert_eq!(window.len(), WINDOW_LEN);
        assert_eq!(window.values().collect::<Vec<_>>(), vec![12.5, 12.5, 12.5]);
    }

    #[test]
    fn length_stays_full_after_many_pushes() {
        let mut window = SmoothingWindow::new();
        for i in 0..10 {
            window.push(i as f64);
            assert_eq!(window.len(), WINDOW_LEN);
        }
    }

    #[test]
    fn returns_mean_of_last_three() {
        let mut window = SmoothingWindow::new();
        window.push(1.0);
        window.push(2.0);
        window.push(4.0);
        let mean = window.push(9.0);
        assert!((mean - 5.0).abs() < 1e-12);
        assert_eq!(window.values().collect::<Vec<_>>(), vec![2.0, 4.0, 9.0]);
    }

    #[test]
    fn second_push_blends_with_replicated_seed() {
        let mut window = SmoothingWindow::new();
        window.push(3.0);
        let mean = window.push(6.0);
        assert!((mean - 4.0).abs() < 1e-12);
    }
}
