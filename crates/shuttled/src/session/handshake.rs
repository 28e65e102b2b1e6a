use std::io::Read;

use crate::isolation::IsolationMode;

use super::errors::HandshakeError;
use super::lines::LineReader;

/// Reads the single token line that opens every session.
///
/// Exactly one line is consumed. Anything the peer sent after it stays in the
/// reader's buffer for the command loop.
pub(crate) fn read_isolation_mode<R: Read>(
    reader: &mut LineReader<R>,
) -> Result<IsolationMode, HandshakeError> {
    let token = reader.read_line()?.ok_or(HandshakeError::Closed)?;
    Ok(IsolationMode::from_token(&token))
}
