//! Line-oriented shell - one boundary call per input line
//!
//! Arguments are tokenized with shell quoting rules, so code containing
//! spaces can be passed as `exec-code "echo 'hi';"`.

use offload_foundation::{Error, Result};
use offload_task::Boundary;
use std::io::{BufRead, Write};

pub const HELP: &str = "\
Commands:
  start                      start a smoke-test task
  start-payload <text>       start a task carrying <text>
  delayed <ms>               start a task that completes after <ms>
  exec-code <code>           run inline code
  exec-file <path>           run a script file
  exec-call <descriptor>     run a function call
  status <id>                -1 not found, 0 running, 1 done
  result <id>                print the stored result
  wait <id> [timeout_ms]     block until done (default timeout from config)
  cleanup <id>               forget a task
  cleanup-temp               delete released scratch files
  stats                      print a JSON stats snapshot
  help                       show this help
  quit                       exit";

/// A parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    StartPayload(String),
    Delayed(i64),
    ExecCode(String),
    ExecFile(String),
    ExecCall(String),
    Status(i64),
    Result(i64),
    Wait { id: i64, timeout_ms: Option<i64> },
    Cleanup(i64),
    CleanupTemp,
    Stats,
    Help,
    Quit,
}

/// Parse one input line; blank lines and `#` comments yield `None`
pub fn parse(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let tokens = shlex::split(line)
        .ok_or_else(|| Error::InvalidInput("unbalanced quotes".to_string()))?;
    let Some((name, args)) = tokens.split_first() else {
        return Ok(None);
    };

    let command = match name.as_str() {
        "start" => {
            arity(name, args, 0, 0)?;
            Command::Start
        }
        "start-payload" => {
            arity(name, args, 1, 1)?;
            Command::StartPayload(args[0].clone())
        }
        "delayed" => {
            arity(name, args, 1, 1)?;
            Command::Delayed(int_arg(name, &args[0])?)
        }
        "exec-code" => {
            arity(name, args, 1, 1)?;
            Command::ExecCode(args[0].clone())
        }
        "exec-file" => {
            arity(name, args, 1, 1)?;
            Command::ExecFile(args[0].clone())
        }
        "exec-call" => {
            arity(name, args, 1, 1)?;
            Command::ExecCall(args[0].clone())
        }
        "status" => {
            arity(name, args, 1, 1)?;
            Command::Status(int_arg(name, &args[0])?)
        }
        "result" => {
            arity(name, args, 1, 1)?;
            Command::Result(int_arg(name, &args[0])?)
        }
        "wait" => {
            arity(name, args, 1, 2)?;
            Command::Wait {
                id: int_arg(name, &args[0])?,
                timeout_ms: args.get(1).map(|t| int_arg(name, t)).transpose()?,
            }
        }
        "cleanup" => {
            arity(name, args, 1, 1)?;
            Command::Cleanup(int_arg(name, &args[0])?)
        }
        "cleanup-temp" => {
            arity(name, args, 0, 0)?;
            Command::CleanupTemp
        }
        "stats" => {
            arity(name, args, 0, 0)?;
            Command::Stats
        }
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(Error::InvalidInput(format!("unknown command '{}'", other))),
    };

    Ok(Some(command))
}

fn arity(name: &str, args: &[String], min: usize, max: usize) -> Result<()> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{}-{}", min, max)
        };
        return Err(Error::InvalidInput(format!(
            "'{}' takes {} argument(s), got {}",
            name,
            expected,
            args.len()
        )));
    }
    Ok(())
}

fn int_arg(name: &str, value: &str) -> Result<i64> {
    value
        .parse()
        .map_err(|_| Error::InvalidInput(format!("'{}' expects an integer, got '{}'", name, value)))
}

/// Run `command` against the boundary and render its reply
pub fn execute(boundary: &Boundary, command: Command) -> Result<String> {
    let reply = match command {
        Command::Start => boundary.start_task().to_string(),
        Command::StartPayload(text) => boundary.start_task_with_payload(&text).to_string(),
        Command::Delayed(ms) => boundary.start_delayed(ms).to_string(),
        Command::ExecCode(code) => boundary.execute_code(&code)?.to_string(),
        Command::ExecFile(path) => boundary.execute_file(&path)?.to_string(),
        Command::ExecCall(descriptor) => boundary.execute_function_call(&descriptor)?.to_string(),
        Command::Status(id) => boundary.status(id).to_string(),
        Command::Result(id) => boundary
            .get_result(id)?
            .unwrap_or_else(|| "(running)".to_string()),
        Command::Wait { id, timeout_ms } => boundary.wait(id, timeout_ms).to_string(),
        Command::Cleanup(id) => {
            boundary.cleanup(id);
            "ok".to_string()
        }
        Command::CleanupTemp => format!("removed {}", boundary.cleanup_temp_files()?),
        Command::Stats => boundary.get_stats(),
        Command::Help => HELP.to_string(),
        Command::Quit => String::new(),
    };
    Ok(reply)
}

/// Read commands until EOF or `quit`
pub fn run<R: BufRead, W: Write>(boundary: &Boundary, input: R, mut output: W) -> std::io::Result<()> {
    for line in input.lines() {
        let line = line?;
        let command = match parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(output, "error: {}", e)?;
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }

        match execute(boundary, command) {
            Ok(reply) => writeln!(output, "{}", reply)?,
            Err(e) => writeln!(output, "error: {}", e)?,
        }
        output.flush()?;
    }
    Ok(())
}
