//! Command parsing for the terminal host

use std::path::PathBuf;

use crate::task::Category;

/// New default durations and, optionally, the alert sound switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefsUpdate {
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub sound: Option<bool>,
}

/// A parsed line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Templates,
    /// Template number (1-based) or name
    Start(String),
    Quick {
        name: String,
        category: Category,
        work_minutes: Option<u32>,
        break_minutes: Option<u32>,
    },
    Toggle,
    Stop,
    Status,
    History,
    Incomplete,
    /// Incomplete task number, 1-based
    Resume(usize),
    Stats,
    Theme,
    /// Show preferences, or change them
    Prefs(Option<PrefsUpdate>),
    /// Write a backup file; `None` picks a dated name
    Export(Option<PathBuf>),
    Import(PathBuf),
    /// Wipe all data; only `reset confirm` goes through
    Reset { confirmed: bool },
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  templates                               list task templates
  start <number|name>                     load a template
  quick <name> [category] [work] [break]  load a custom task
  toggle, t, <enter>                      start focus / take a break / back to focus
  stop                                    stop the current task
  status                                  show the timer
  history                                 recent sessions
  incomplete                              tasks saved for later
  resume <number>                         continue a saved task
  stats                                   your statistics
  theme                                   switch light/dark theme
  prefs [<work> <break> [sound on|off]]   show or change defaults
  export [path]                           back up all data as JSON
  import <path>                           merge a backup into your data
  reset confirm                           delete all data
  help                                    this message
  quit                                    save and exit";

/// Parse one input line
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "" | "t" | "toggle" => Command::Toggle,
        "templates" => Command::Templates,
        "start" => {
            if rest.is_empty() {
                return Err("usage: start <number|name>".to_string());
            }
            Command::Start(rest.to_string())
        }
        "quick" => parse_quick(rest)?,
        "stop" => Command::Stop,
        "status" | "s" => Command::Status,
        "history" => Command::History,
        "incomplete" => Command::Incomplete,
        "resume" => {
            let index = rest
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| "usage: resume <number>".to_string())?;
            Command::Resume(index)
        }
        "stats" => Command::Stats,
        "theme" => Command::Theme,
        "prefs" | "preferences" => parse_prefs(rest)?,
        "export" => Command::Export((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "import" => {
            if rest.is_empty() {
                return Err("usage: import <path>".to_string());
            }
            Command::Import(PathBuf::from(rest))
        }
        "reset" => match rest {
            "" => Command::Reset { confirmed: false },
            "confirm" => Command::Reset { confirmed: true },
            _ => return Err("usage: reset confirm".to_string()),
        },
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{}', type 'help'", other)),
    };

    Ok(command)
}

/// `quick <name words...> [category] [work] [break]`
///
/// Trailing numbers are durations and a trailing category word is the
/// category; everything before them is the name.
fn parse_quick(rest: &str) -> Result<Command, String> {
    let mut words: Vec<&str> = rest.split_whitespace().collect();

    let mut numbers = Vec::new();
    while numbers.len() < 2 {
        match words.last().and_then(|w| w.parse::<u32>().ok()) {
            Some(n) if words.len() > 1 => {
                numbers.push(n);
                words.pop();
            }
            _ => break,
        }
    }
    numbers.reverse();

    let mut category = Category::Other;
    if words.len() > 1 {
        if let Some(parsed) = words.last().and_then(|w| w.parse::<Category>().ok()) {
            category = parsed;
            words.pop();
        }
    }

    if words.is_empty() {
        return Err("usage: quick <name> [category] [work] [break]".to_string());
    }

    Ok(Command::Quick {
        name: words.join(" "),
        category,
        work_minutes: numbers.first().copied(),
        break_minutes: numbers.get(1).copied(),
    })
}

/// `prefs`, `prefs <work> <break>`, `prefs <work> <break> [sound] on|off`
fn parse_prefs(rest: &str) -> Result<Command, String> {
    if rest.is_empty() {
        return Ok(Command::Prefs(None));
    }

    let usage = || "usage: prefs [<work> <break> [sound on|off]]".to_string();
    let words: Vec<&str> = rest.split_whitespace().collect();
    let (durations, switch) = words.split_at(words.len().min(2));
    let [work, brk] = durations else {
        return Err(usage());
    };
    let work_minutes = work.parse::<u32>().map_err(|_| usage())?;
    let break_minutes = brk.parse::<u32>().map_err(|_| usage())?;

    let sound = match switch {
        [] => None,
        [flag] | ["sound", flag] => match *flag {
            "on" => Some(true),
            "off" => Some(false),
            _ => return Err(usage()),
        },
        _ => return Err(usage()),
    };

    Ok(Command::Prefs(Some(PrefsUpdate {
        work_minutes,
        break_minutes,
        sound,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_aliases() {
        assert_eq!(parse(""), Ok(Command::Toggle));
        assert_eq!(parse("  t "), Ok(Command::Toggle));
        assert_eq!(parse("TOGGLE"), Ok(Command::Toggle));
    }

    #[test]
    fn test_start_keeps_spaces() {
        assert_eq!(
            parse("start deep work"),
            Ok(Command::Start("deep work".to_string()))
        );
        assert!(parse("start").is_err());
    }

    #[test]
    fn test_quick_full() {
        assert_eq!(
            parse("quick write report work 40 10"),
            Ok(Command::Quick {
                name: "write report".to_string(),
                category: Category::Work,
                work_minutes: Some(40),
                break_minutes: Some(10),
            })
        );
    }

    #[test]
    fn test_quick_name_only() {
        assert_eq!(
            parse("quick inbox"),
            Ok(Command::Quick {
                name: "inbox".to_string(),
                category: Category::Other,
                work_minutes: None,
                break_minutes: None,
            })
        );
    }

    #[test]
    fn test_quick_name_that_looks_like_category() {
        assert_eq!(
            parse("quick reading"),
            Ok(Command::Quick {
                name: "reading".to_string(),
                category: Category::Other,
                work_minutes: None,
                break_minutes: None,
            })
        );
        assert!(parse("quick").is_err());
    }

    #[test]
    fn test_resume_requires_positive_number() {
        assert_eq!(parse("resume 2"), Ok(Command::Resume(2)));
        assert!(parse("resume 0").is_err());
        assert!(parse("resume x").is_err());
    }

    #[test]
    fn test_prefs() {
        assert_eq!(parse("prefs"), Ok(Command::Prefs(None)));
        assert_eq!(
            parse("prefs 40 10"),
            Ok(Command::Prefs(Some(PrefsUpdate {
                work_minutes: 40,
                break_minutes: 10,
                sound: None,
            })))
        );
        assert_eq!(
            parse("prefs 50 10 sound off"),
            Ok(Command::Prefs(Some(PrefsUpdate {
                work_minutes: 50,
                break_minutes: 10,
                sound: Some(false),
            })))
        );
        assert_eq!(
            parse("prefs 25 5 on"),
            Ok(Command::Prefs(Some(PrefsUpdate {
                work_minutes: 25,
                break_minutes: 5,
                sound: Some(true),
            })))
        );
        assert!(parse("prefs 25").is_err());
        assert!(parse("prefs 25 5 loud").is_err());
        assert!(parse("prefs x 5").is_err());
    }

    #[test]
    fn test_export_import_reset() {
        assert_eq!(parse("export"), Ok(Command::Export(None)));
        assert_eq!(
            parse("export my backup.json"),
            Ok(Command::Export(Some(PathBuf::from("my backup.json"))))
        );
        assert_eq!(
            parse("import backup.json"),
            Ok(Command::Import(PathBuf::from("backup.json")))
        );
        assert!(parse("import").is_err());
        assert_eq!(parse("reset"), Ok(Command::Reset { confirmed: false }));
        assert_eq!(parse("reset confirm"), Ok(Command::Reset { confirmed: true }));
        assert!(parse("reset now").is_err());
    }

    #[test]
    fn test_unknown_command() {
        assert!(parse("dance").is_err());
    }
}
