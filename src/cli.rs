use crate::{Error, Result};

/// Options for the `run` command; values are `None` when not provided on CLI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunOptions {
    pub config_path: Option<String>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    /// Log what would be shown instead of driving the LED matrix and joystick.
    pub headless: bool,
    pub no_upload: bool,
    pub no_webcam: bool,
}

/// Parsed command-line intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(RunOptions),
    ShowHelp,
    ShowVersion,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        if args.is_empty() {
            return Ok(Command::Run(RunOptions::default()));
        }

        let mut iter = args.iter();
        match iter.next().map(|s| s.as_str()) {
            Some("run") => Ok(Command::Run(parse_run_options(&mut iter)?)),
            Some("--help") | Some("-h") => Ok(Command::ShowHelp),
            Some("--version") | Some("-V") => Ok(Command::ShowVersion),
            Some(flag) if flag.starts_with('-') => {
                // `run` is optional: hand the consumed flag back to the run parser.
                let mut flags: Vec<String> = Vec::with_capacity(args.len());
                flags.push(flag.to_string());
                flags.extend(iter.map(|s| s.to_string()));
                let mut iter = flags.iter();
                Ok(Command::Run(parse_run_options(&mut iter)?))
            }
            Some(cmd) => Err(Error::InvalidArgs(format!(
                "unknown command '{cmd}', try --help"
            ))),
            None => Ok(Command::Run(RunOptions::default())),
        }
    }

    pub fn help() -> &'static str {
        concat!(
            "weather-station - Sense HAT weather station\n",
            "\n",
            "USAGE:\n",
            "  weather-station run [--config <path>] [--log-level <level>] [--log-file <path>]\n",
            "                      [--headless] [--no-upload] [--no-webcam]\n",
            "  weather-station --help\n",
            "  weather-station --version\n",
            "\n",
            "OPTIONS:\n",
            "  --config <path>      Config file (default: ~/.weather_station/config.toml)\n",
            "  --log-level <level>  error, warn, info, debug or trace (default: info)\n",
            "  --log-file <path>    Append logs to this file (default: station.log)\n",
            "  --headless           Log display output instead of using the LED matrix\n",
            "  --no-upload          Do not upload readings\n",
            "  --no-webcam          Do not capture or upload pictures\n",
            "  -h, --help           Show this help\n",
            "  -V, --version        Show version\n",
        )
    }

    pub fn print_help() {
        println!("{}", Self::help());
    }
}

fn parse_run_options(iter: &mut std::slice::Iter<String>) -> Result<RunOptions> {
    let mut opts = RunOptions::default();

    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--config" => {
                opts.config_path = Some(take_value(flag, iter)?);
            }
            "--log-level" => {
                let raw = take_value(flag, iter)?;
                if raw.parse::<crate::app::LogLevel>().is_err() {
                    return Err(Error::InvalidArgs(format!(
                        "log level must be one of error, warn, info, debug, trace (got '{raw}')"
                    )));
                }
                opts.log_level = Some(raw);
            }
            "--log-file" => {
                opts.log_file = Some(take_value(flag, iter)?);
            }
            "--headless" => opts.headless = true,
            "--no-upload" => opts.no_upload = true,
            "--no-webcam" => opts.no_webcam = true,
            other => {
                return Err(Error::InvalidArgs(format!(
                    "unknown flag '{other}', try --help"
                )));
            }
        }
    }

    Ok(opts)
}

fn take_value(flag: &str, iter: &mut std::slice::Iter<String>) -> Result<String> {
    iter.next()
        .cloned()
        .ok_or_else(|| Error::InvalidArgs(format!("expected a value after {flag}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_defaults_with_no_args() {
        let cmd = Command::parse(&[]).unwrap();
        assert_eq!(cmd, Command::Run(RunOptions::default()));
    }

    #[test]
    fn parse_run_with_overrides() {
        let cmd = Command::parse(&args(&[
            "run",
            "--config",
            "/etc/weather.toml",
            "--log-level",
            "debug",
            "--headless",
            "--no-webcam",
        ]))
        .unwrap();
        assert_eq!(
            cmd,
            Command::Run(RunOptions {
                config_path: Some("/etc/weather.toml".into()),
                log_level: Some("debug".into()),
                headless: true,
                no_webcam: true,
                ..RunOptions::default()
            })
        );
    }

    #[test]
    fn parse_run_allows_implicit_subcommand() {
        let cmd = Command::parse(&args(&["--no-upload", "--log-file", "/tmp/ws.log"])).unwrap();
        let Command::Run(opts) = cmd else {
            panic!("expected run command");
        };
        assert!(opts.no_upload);
        assert_eq!(opts.log_file.as_deref(), Some("/tmp/ws.log"));
    }

    #[test]
    fn parse_help_and_version() {
        assert_eq!(Command::parse(&args(&["--help"])).unwrap(), Command::ShowHelp);
        assert_eq!(Command::parse(&args(&["-V"])).unwrap(), Command::ShowVersion);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(Command::parse(&args(&["--bogus"])).is_err());
        assert!(Command::parse(&args(&["serve"])).is_err());
        assert!(Command::parse(&args(&["--config"])).is_err());
        let err = Command::parse(&args(&["--log-level", "loud"])).unwrap_err();
        assert!(format!("{err}").contains("log level"));
    }
}
