//! Interactive shell loop and command dispatch.
//!
//! Each input line is tokenized with quote handling, parsed with the same
//! clap definitions as one-shot invocations, and dispatched to exactly one
//! console operation. Errors print a one-line message and the loop
//! continues; only I/O failures on the terminal itself end the session.

use std::io::{self, BufRead, Write};

use clap::Parser;
use conch_console::{ConsoleService, FileContent};
use conch_types::{DisplayMode, ReadMode, Result};

use crate::cli::Command;

/// Wrapper so clap can parse an already-tokenized shell line.
#[derive(Parser, Debug)]
#[command(name = "conch", no_binary_name = true)]
struct LineArgs {
    #[command(subcommand)]
    command: Command,
}

/// Run the interactive shell until `exit` or end of input.
pub fn run(console: &mut dyn ConsoleService) -> io::Result<()> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("{} $ ", console.cwd().display());
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let tokens = match tokenize(&line) {
            Ok(tokens) => tokens,
            Err(msg) => {
                eprintln!("conch: {msg}");
                continue;
            },
        };
        if tokens.is_empty() {
            continue;
        }

        match tokens[0].as_str() {
            "exit" | "quit" => break,
            "pwd" => println!("{}", console.cwd().display()),
            "help" => print_help(),
            _ => match LineArgs::try_parse_from(&tokens) {
                Ok(args) => {
                    if let Err(e) = dispatch(console, args.command) {
                        eprintln!("conch: {e}");
                    }
                },
                Err(e) => {
                    // clap renders its own usage/help output.
                    let _ = e.print();
                },
            },
        }
    }
    Ok(())
}

/// Execute one parsed command against the console, writing results to
/// stdout.
pub fn dispatch(console: &mut dyn ConsoleService, command: Command) -> Result<()> {
    match command {
        Command::Ls { path, long } => {
            let mode = if long {
                DisplayMode::Detailed
            } else {
                DisplayMode::Simple
            };
            let lines = console.ls(path.as_deref().unwrap_or("."), mode)?;
            let mut out = io::stdout().lock();
            for line in &lines {
                out.write_all(line.as_bytes())?;
            }
            out.flush()?;
        },
        Command::Cat { file, bytes } => {
            let mode = if bytes { ReadMode::Binary } else { ReadMode::Text };
            match console.cat(&file, mode)? {
                FileContent::Text(text) => {
                    let mut out = io::stdout().lock();
                    out.write_all(text.as_bytes())?;
                    out.flush()?;
                },
                FileContent::Bytes(data) => {
                    let mut out = io::stdout().lock();
                    out.write_all(&data)?;
                    out.flush()?;
                },
            }
        },
        Command::Cd { path } => {
            let target = console.cd(&path)?;
            println!("{}", target.display());
        },
        Command::Cp {
            src,
            dst,
            recursive,
        } => console.cp(&src, &dst, recursive)?,
        Command::Mv { src, dst } => console.mv(&src, &dst)?,
        Command::Rm { path, recursive } => console.rm(&path, recursive)?,
        Command::Zip { dir, archive } => console.zip(&dir, &archive)?,
        Command::Unzip { archive, dest } => console.unzip(&archive, dest.as_deref())?,
        Command::Tar { dir, archive } => console.tar(&dir, &archive)?,
        Command::Untar { archive, dest } => console.untar(&archive, dest.as_deref())?,
        Command::Grep {
            pattern,
            path,
            recursive,
            ignore_case,
        } => {
            for m in console.grep(&pattern, &path, recursive, ignore_case)? {
                println!("{m}");
            }
        },
    }
    Ok(())
}

/// Split a shell line into tokens, honoring single and double quotes and
/// backslash escapes.
fn tokenize(input: &str) -> std::result::Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(ch) = chars.next() {
        if in_single {
            if ch == '\'' {
                in_single = false;
            } else {
                current.push(ch);
            }
        } else if in_double {
            match ch {
                '"' => in_double = false,
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                },
                _ => current.push(ch),
            }
        } else {
            match ch {
                '\'' => in_single = true,
                '"' => in_double = true,
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                },
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                },
                _ => current.push(ch),
            }
        }
    }

    if in_single {
        return Err("unterminated single quote".to_string());
    }
    if in_double {
        return Err("unterminated double quote".to_string());
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

fn print_help() {
    println!("commands:");
    println!("  ls [-l] [path]              list directory contents");
    println!("  cat [-b] <file>             print file contents");
    println!("  cd <path>                   change working directory");
    println!("  cp [-r] <src> <dst>         copy a file or directory");
    println!("  mv <src> <dst>              move or rename");
    println!("  rm [-r] <path>              remove a file or directory");
    println!("  zip <dir> <archive>         pack a directory into a zip");
    println!("  unzip <archive> [dest]      extract a zip archive");
    println!("  tar <dir> <archive>         pack a directory into a tar.gz");
    println!("  untar <archive> [dest]      extract a tar.gz archive");
    println!("  grep [-r] [-i] <pat> <path> search file contents");
    println!("  pwd                         print working directory");
    println!("  help                        show this help");
    println!("  exit                        leave the shell");
}

#[cfg(test)]
mod tests {
    use super::*;
    use conch_console::HostConsole;
    use std::fs;

    #[test]
    fn tokenize_simple() {
        assert_eq!(tokenize("ls -l /tmp").unwrap(), vec!["ls", "-l", "/tmp"]);
    }

    #[test]
    fn tokenize_single_quotes() {
        assert_eq!(
            tokenize("cat 'a file.txt'").unwrap(),
            vec!["cat", "a file.txt"]
        );
    }

    #[test]
    fn tokenize_double_quotes() {
        assert_eq!(
            tokenize(r#"grep "two words" ."#).unwrap(),
            vec!["grep", "two words", "."]
        );
    }

    #[test]
    fn tokenize_backslash_escape() {
        assert_eq!(tokenize(r"cat a\ b.txt").unwrap(), vec!["cat", "a b.txt"]);
    }

    #[test]
    fn tokenize_unterminated_quote_is_error() {
        assert!(tokenize("cat 'oops").is_err());
        assert!(tokenize("cat \"oops").is_err());
    }

    #[test]
    fn tokenize_empty_line() {
        assert!(tokenize("   \n").unwrap().is_empty());
    }

    #[test]
    fn line_args_parse_shell_tokens() {
        let args = LineArgs::try_parse_from(["rm", "-r", "old"]).unwrap();
        match args.command {
            Command::Rm { path, recursive } => {
                assert_eq!(path, "old");
                assert!(recursive);
            },
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn dispatch_cp_copies_through_console() {
        let td = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(td.path()).unwrap();
        fs::write(root.join("a.txt"), "payload").unwrap();
        let mut console = HostConsole::with_cwd(&root);
        dispatch(
            &mut console,
            Command::Cp {
                src: "a.txt".into(),
                dst: "b.txt".into(),
                recursive: false,
            },
        )
        .unwrap();
        assert_eq!(fs::read_to_string(root.join("b.txt")).unwrap(), "payload");
    }

    #[test]
    fn dispatch_surfaces_console_errors() {
        let td = tempfile::tempdir().unwrap();
        let mut console = HostConsole::with_cwd(td.path());
        let err = dispatch(
            &mut console,
            Command::Rm {
                path: "..".into(),
                recursive: true,
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            conch_types::ConsoleError::PermissionDenied(_)
        ));
    }
}
