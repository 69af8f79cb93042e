//! Complaint command parsing
//!
//! Complaints arrive as the body of a chat command, shaped like
//! `hacking Player's name 'Describe the cheat here'`. The body must hold
//! exactly two quote characters; the reason is everything between them and
//! the offender name is everything between the keyword and the first quote.

use crate::error::MalformedKind;

pub const QUOTE: char = '\'';

/// A structurally valid complaint, not yet resolved against the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedComplaint {
    pub offender_name: String,
    pub reason: String,
}

/// Parse a complaint command body.
///
/// The quote count is checked before the keyword, so a body with the wrong
/// number of quotes is reported as such regardless of its prefix.
pub fn parse_complaint(body: &str, keyword: &str) -> Result<ParsedComplaint, MalformedKind> {
    let quotes = body.chars().filter(|&c| c == QUOTE).count();
    if quotes != 2 {
        return Err(MalformedKind::QuoteCount(quotes));
    }

    let rest = body
        .strip_prefix(keyword)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or(MalformedKind::MissingKeyword)?;

    // Only a keyword containing a quote can eat one of the two counted above.
    let (open, close) = match (rest.find(QUOTE), rest.rfind(QUOTE)) {
        (Some(open), Some(close)) if open < close => (open, close),
        _ => return Err(MalformedKind::QuoteCount(rest.matches(QUOTE).count())),
    };

    let name = &rest[..open];
    let name = name.strip_suffix(' ').unwrap_or(name);

    Ok(ParsedComplaint {
        offender_name: name.to_string(),
        reason: rest[open + QUOTE.len_utf8()..close].to_string(),
    })
}
