//! Server configuration parsing (flat key/value text → `ServerConfig`).

use crate::config::types::*;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parser state machine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Where the parser is within the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// At top level, reading directives.
    Idle,
    /// Inside a reserved inline block, accumulating body lines.
    InBlock(BlockName),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parse a server configuration document in a single forward pass.
///
/// Tag lines are matched exactly after trimming, and tag detection takes
/// precedence over directive parsing. Directive lines split on the first
/// space; top-level lines with no space (flag directives, blank lines)
/// are ignored. Block bodies are stored trimmed of surrounding whitespace.
pub fn parse_server_config(text: &str) -> Result<ServerConfig, ConfigError> {
    let mut cfg = ServerConfig::default();
    let mut state = ParserState::Idle;
    let mut body: Vec<&str> = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();

        match state {
            ParserState::Idle => {
                if let Some(name) = BlockName::from_open_tag(line) {
                    state = ParserState::InBlock(name);
                    body.clear();
                    continue;
                }
                if BlockName::from_close_tag(line).is_some() {
                    return Err(ConfigError::malformed(format!(
                        "closing tag {} without a matching opening tag",
                        line
                    )));
                }
                if let Some((key, value)) = line.split_once(' ') {
                    cfg.directives
                        .push((key.trim().to_string(), value.trim().to_string()));
                }
                // No space: blank line or bare flag, nothing to record.
            }
            ParserState::InBlock(open) => {
                if let Some(close) = BlockName::from_close_tag(line) {
                    if close != open {
                        return Err(ConfigError::malformed(format!(
                            "closing tag {} does not match open block <{}>",
                            line, open
                        )));
                    }
                    cfg.set_block(open, body.join("\n").trim().to_string());
                    state = ParserState::Idle;
                    continue;
                }
                if let Some(nested) = BlockName::from_open_tag(line) {
                    return Err(ConfigError::malformed(format!(
                        "opening tag <{}> inside unclosed block <{}>",
                        nested, open
                    )));
                }
                // Body lines are kept verbatim.
                body.push(raw);
            }
        }
    }

    if let ParserState::InBlock(open) = state {
        return Err(ConfigError::malformed(format!(
            "unterminated block <{}> at end of input",
            open
        )));
    }

    log::debug!(
        "parsed {} directives, {} inline blocks",
        cfg.directives.len(),
        BlockName::ALL.iter().filter(|n| cfg.block(**n).is_some()).count()
    );
    Ok(cfg)
}
