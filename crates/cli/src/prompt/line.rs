//! Line-based prompts for free-text inputs.

use std::io::{BufRead, Write};

use ilc_core::error::Result;
use ilc_core::input::Input;

/// Prompts for a value for `input` until a valid one is entered.
///
/// Returns `Ok(None)` when the input stream ends, which the caller treats as a
/// cancellation.
///
/// # Errors
///
/// Returns an error if reading or writing the terminal fails.
pub fn prompt_value<R: BufRead, W: Write>(
    input: &Input,
    reader: &mut R,
    writer: &mut W,
) -> Result<Option<String>> {
    loop {
        write!(writer, "Value for {input} <{}>: ", input.value.kind())?;
        writer.flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            writeln!(writer)?;
            return Ok(None);
        }

        let value = line.trim();
        match input.validate(value) {
            Ok(_) => return Ok(Some(value.to_string())),
            Err(e) => writeln!(writer, "Invalid value: {e}")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilc_core::input::{NumberValue, Value};
    use std::io::Cursor;

    fn replicas() -> Input {
        let mut input = Input::new(
            "replicas",
            Value::Number(NumberValue {
                value: 0.0,
                min: Some(1.0),
                max: Some(5.0),
            }),
        );
        input.description = Some("How many".to_string());
        input
    }

    #[test]
    fn test_prompt_value_retries_until_valid() {
        let mut reader = Cursor::new("lots\n9\n 3 \n");
        let mut output = Vec::new();

        let value = prompt_value(&replicas(), &mut reader, &mut output).unwrap();
        assert_eq!(value.as_deref(), Some("3"));

        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("Value for `replicas` (How many) <number>: "));
        assert_eq!(output.matches("Invalid value").count(), 2);
    }

    #[test]
    fn test_prompt_value_end_of_input_cancels() {
        let mut reader = Cursor::new("");
        let mut output = Vec::new();

        assert_eq!(prompt_value(&replicas(), &mut reader, &mut output).unwrap(), None);
    }
}
