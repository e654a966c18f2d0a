//! Line-oriented prompts over any reader/writer pair.

use std::io::{self, BufRead, Write};

use anyhow::{Result, bail};

pub(crate) struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    pub(crate) fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub(crate) fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub(crate) fn say(&mut self, line: impl AsRef<str>) -> Result<()> {
        writeln!(self.output, "{}", line.as_ref())?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("input closed");
        }
        Ok(line.trim().to_string())
    }

    /// Empty input keeps `default_value`.
    pub(crate) fn prompt(&mut self, label: &str, default_value: &str) -> Result<String> {
        write!(self.output, "{label} [{default_value}]: ")?;
        let line = self.read_line()?;
        if line.is_empty() {
            return Ok(default_value.to_string());
        }
        Ok(line)
    }

    pub(crate) fn prompt_bool(&mut self, label: &str, default_value: bool) -> Result<bool> {
        let default_label = if default_value { "yes" } else { "no" };
        loop {
            let value = self.prompt(label, default_label)?;
            match parse_bool_like(&value) {
                Ok(answer) => return Ok(answer),
                Err(err) => self.say(err.to_string())?,
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn into_output(self) -> W {
        self.output
    }
}

pub(crate) fn parse_bool_like(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Ok(true),
        "n" | "no" | "false" | "0" => Ok(false),
        _ => bail!("expected yes/no"),
    }
}
