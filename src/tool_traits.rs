//! Typed argument contracts for external tools.
//!
//! Every system tool the installer drives (`parted`, `mkfs.*`, `pacstrap`,
//! `arch-chroot` ...) has a struct implementing [`ToolArgs`]. The struct is the
//! contract: flag spelling and argument order are fixed in one `to_cli_args`
//! body instead of being rebuilt from strings at every call site.

use std::fmt;

/// Trait for typed tool arguments.
///
/// # Contract
///
/// - `program()`: executable name, resolved on `PATH` at execution time.
/// - `to_cli_args()`: arguments exactly as the tool expects them.
/// - `get_env_vars()`: extra environment for the child, empty by default.
/// - `is_destructive()`: true when the tool modifies disks or the target root.
///   Dry-run hosts never execute these.
///
/// # Example
///
/// ```ignore
/// use cvh_install::tools::disk::WipeSignatures;
///
/// let args = WipeSignatures { disk: "/dev/sda".into() };
/// assert_eq!(args.to_cli_args(), ["-af", "/dev/sda"]);
/// ```
pub trait ToolArgs {
    /// Executable name
    fn program(&self) -> &'static str;

    /// Convert struct fields to command line arguments.
    fn to_cli_args(&self) -> Vec<String>;

    /// Environment variables the tool requires.
    fn get_env_vars(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Whether running the tool changes disks, mounts or the target root.
    fn is_destructive(&self) -> bool {
        true
    }

    /// Snapshot of this invocation for execution or recording.
    fn invocation(&self) -> Invocation {
        Invocation {
            program: self.program().to_string(),
            args: self.to_cli_args(),
            env: self.get_env_vars(),
            destructive: self.is_destructive(),
        }
    }
}

/// A fully resolved tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub destructive: bool,
}

impl Invocation {
    /// Shell-like rendering for logs and dry-run listings.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote_arg)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

fn quote_arg(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,%@+".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(Vec<&'static str>);

    impl ToolArgs for Echo {
        fn program(&self) -> &'static str {
            "echo"
        }
        fn to_cli_args(&self) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }
        fn is_destructive(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_invocation_snapshot() {
        let inv = Echo(vec!["hello"]).invocation();
        assert_eq!(inv.program, "echo");
        assert_eq!(inv.args, vec!["hello"]);
        assert!(inv.env.is_empty());
        assert!(!inv.destructive);
    }

    #[test]
    fn test_command_line_quotes_spaces() {
        let inv = Echo(vec!["-n", "two words", "it's"]).invocation();
        assert_eq!(inv.command_line(), r"echo -n 'two words' 'it'\''s'");
    }

    #[test]
    fn test_command_line_plain_paths() {
        let inv = Echo(vec!["/dev/sda1", "513MiB", "100%"]).invocation();
        assert_eq!(inv.to_string(), "echo /dev/sda1 513MiB 100%");
    }
}
