use std::io::{BufRead, Write};
use std::thread;
use std::time::Duration;

use anyhow::Result;

// Matches the CSS transition length of the original curtain animation.
const CURTAIN_OPEN_MS: u64 = 1800;

pub struct CurtainScreen;

impl CurtainScreen {
    /// Shows the closed curtain and blocks until the visitor opens it.
    /// Returns once the opening transition has played out.
    pub fn run(input: &mut impl BufRead, output: &mut impl Write) -> Result<()> {
        writeln!(output)?;
        writeln!(output, "════════════════════════════════════════")?;
        writeln!(output, "            EMOTION  CURTAIN            ")?;
        writeln!(output, "════════════════════════════════════════")?;
        writeln!(output, "Pulsa ENTER para abrir el telón…")?;
        output.flush()?;

        let mut line = String::new();
        input.read_line(&mut line)?;

        writeln!(output, "El telón se abre…")?;
        output.flush()?;
        thread::sleep(Duration::from_millis(CURTAIN_OPEN_MS));

        Ok(())
    }
}
