//! Command-line argument parsing.
//!
//! [`Arguments`] splits a command line into the program path, flags with
//! optional arguments, and operands. It is a plain value: parse it once at
//! the entry point and pass it to whoever needs it.
//!
//! Parsing rules:
//!
//! * the first word is the program path;
//! * `--name=value` passes the long flag `name` with argument `value`;
//! * `--name` passes the long flag `name`;
//! * `-abc` passes the short flags `a`, `b` and `c`;
//! * a passed flag that is not inert and has no argument yet takes the next
//!   plain word as its argument, the most recently passed flag first;
//! * every other plain word is an operand;
//! * after `--` every word is an operand.
//!
//! ```rust
//! use stridepool::Arguments;
//!
//! let mut args = Arguments::new();
//! args.set_inert('f');
//! args.pass_str("prog -fv 5 input.txt --mode=fast");
//! assert!(args.is_passed('f'));
//! assert_eq!(args.argument('v'), Some("5"));
//! assert_eq!(args.argument("mode"), Some("fast"));
//! assert_eq!(args.operand(0), Some("input.txt"));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A flag name: `'v'` for `-v`, `"verbose"` for `--verbose`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flag {
    Short(char),
    Long(String),
}

impl From<char> for Flag {
    fn from(c: char) -> Self {
        Flag::Short(c)
    }
}

impl From<&str> for Flag {
    /// Accepts `"name"`, `"--name"` and `"-c"`.
    fn from(s: &str) -> Self {
        if let Some(long) = s.strip_prefix("--") {
            return Flag::Long(long.to_owned());
        }
        if let Some(short) = s.strip_prefix('-') {
            let mut chars = short.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                return Flag::Short(c);
            }
        }
        Flag::Long(s.to_owned())
    }
}

impl From<String> for Flag {
    fn from(s: String) -> Self {
        Flag::from(s.as_str())
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Short(c) => write!(f, "-{}", c),
            Flag::Long(name) => write!(f, "--{}", name),
        }
    }
}

/// Parsed command line.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    path: String,
    flags: BTreeMap<Flag, Option<String>>,
    operands: Vec<String>,
    inert: BTreeSet<Flag>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the arguments of the running process.
    pub fn from_env() -> Self {
        let mut args = Self::new();
        args.pass(std::env::args());
        args
    }

    /// Marks a flag as never taking an argument. Must be called before
    /// [`pass`](Self::pass) to have an effect.
    pub fn set_inert(&mut self, flag: impl Into<Flag>) {
        self.inert.insert(flag.into());
    }

    pub fn is_inert(&self, flag: impl Into<Flag>) -> bool {
        self.inert.contains(&flag.into())
    }

    /// Parses a command line, replacing the result of any previous parse.
    /// Inert flags are kept.
    pub fn pass<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.path.clear();
        self.flags.clear();
        self.operands.clear();

        let mut words = words.into_iter();
        if let Some(path) = words.next() {
            self.path = path.as_ref().to_owned();
        }

        let mut unset: Vec<Flag> = Vec::new();
        let mut only_operands = false;

        for word in words {
            let word = word.as_ref();

            if only_operands {
                self.operands.push(word.to_owned());
            } else if word == "--" {
                only_operands = true;
            } else if let Some(long) = word.strip_prefix("--") {
                match long.split_once('=') {
                    Some((name, value)) => {
                        self.flags
                            .insert(Flag::Long(name.to_owned()), Some(value.to_owned()));
                    }
                    None => self.set_flag(Flag::Long(long.to_owned()), &mut unset),
                }
            } else if let Some(shorts) = word.strip_prefix('-').filter(|s| !s.is_empty()) {
                for c in shorts.chars() {
                    self.set_flag(Flag::Short(c), &mut unset);
                }
            } else if let Some(flag) = unset.pop() {
                self.flags.insert(flag, Some(word.to_owned()));
            } else {
                self.operands.push(word.to_owned());
            }
        }
    }

    /// Parses a whitespace-separated command line.
    pub fn pass_str(&mut self, line: &str) {
        self.pass(line.split_whitespace());
    }

    fn set_flag(&mut self, flag: Flag, unset: &mut Vec<Flag>) {
        if self.flags.contains_key(&flag) {
            return;
        }
        if !self.inert.contains(&flag) {
            unset.push(flag.clone());
        }
        self.flags.insert(flag, None);
    }

    pub fn is_passed(&self, flag: impl Into<Flag>) -> bool {
        self.flags.contains_key(&flag.into())
    }

    /// The argument given to a flag, `None` when the flag was not passed or
    /// took no argument.
    pub fn argument(&self, flag: impl Into<Flag>) -> Option<&str> {
        self.flags.get(&flag.into()).and_then(|a| a.as_deref())
    }

    /// The program path, the first word of the command line.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn operand(&self, index: usize) -> Option<&str> {
        self.operands.get(index).map(String::as_str)
    }

    pub fn operand_count(&self) -> usize {
        self.operands.len()
    }

    pub fn operands(&self) -> &[String] {
        &self.operands
    }
}

impl fmt::Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "path: {}", self.path)?;
        for (flag, argument) in &self.flags {
            match argument {
                Some(argument) => writeln!(f, "flag: {} = {}", flag, argument)?,
                None => writeln!(f, "flag: {}", flag)?,
            }
        }
        for (i, operand) in self.operands.iter().enumerate() {
            writeln!(f, "operand {}: {}", i, operand)?;
        }
        Ok(())
    }
}
