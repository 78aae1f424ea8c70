//! Request-line and article tokenization.
//!
//! Parses the textual syntax RFC 3977 defines for commands (§3.1) and
//! articles (§3.6). Header semantics (lower-casing, multivalue
//! splitting, required-field validation) live in [`crate::article`];
//! this module only turns bytes into `(name, value)` pairs.

use nom::{
    IResult,
    bytes::complete::{is_not, take_till, take_while1},
    character::complete::{char, crlf, space0, space1},
    combinator::opt,
    multi::separated_list1,
    sequence::preceded,
};

/// A tokenized request line: uppercased keyword plus original-case args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

/// Parse a single NNTP command line (RFC 3977 §3.1).
pub fn parse_command(input: &str) -> IResult<&str, Command> {
    let (input, name) = take_while1(|c: char| c.is_ascii_alphabetic())(input)?;
    let (input, args) = opt(preceded(space1, separated_list1(space1, is_not(" \t"))))(input)?;
    let args_vec = args
        .unwrap_or_default()
        .into_iter()
        .map(str::to_string)
        .collect();
    Ok((
        input,
        Command {
            name: name.to_ascii_uppercase(),
            args: args_vec,
        },
    ))
}

/// A single raw header line: the name as written and its (possibly
/// folded-and-joined) value.
pub type RawHeader = (String, String);

/// A dot-terminated article: raw header lines in arrival order, plus
/// the unstuffed body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArticle {
    pub headers: Vec<RawHeader>,
    pub body: String,
}

fn parse_header_line(input: &str) -> IResult<&str, RawHeader> {
    let (i, name) = take_while1(|c: char| c != ':' && c != '\r' && c != '\n')(input)?;
    let (i, _) = char(':')(i)?;
    let (i, _) = space0(i)?;
    let (i, value) = take_till(|c| c == '\r' || c == '\n')(i)?;
    let (mut i, _) = crlf(i)?;
    let mut val = value.to_string();

    while i.starts_with(' ') || i.starts_with('\t') {
        let (next, _) = take_while1(|c| c == ' ' || c == '\t')(i)?;
        let (next, cont) = take_till(|c| c == '\r' || c == '\n')(next)?;
        let (next, _) = crlf(next)?;
        val.push(' ');
        val.push_str(cont.trim());
        i = next;
    }

    Ok((i, (name.to_string(), val)))
}

fn parse_header_block(mut input: &str) -> IResult<&str, Vec<RawHeader>> {
    let mut headers = Vec::new();
    loop {
        if let Some(rest) = input.strip_prefix("\r\n") {
            input = rest;
            break;
        }
        if input.is_empty() {
            break;
        }
        let (next, header) = parse_header_line(input)?;
        headers.push(header);
        input = next;
    }
    Ok((input, headers))
}

/// Parse an article already assembled from a dot-terminated read (see
/// [`crate::handlers::utils::read_dot_terminated`]): header block,
/// blank line, then body verbatim.
pub fn parse_article(input: &str) -> IResult<&str, RawArticle> {
    let (input, headers) = parse_header_block(input)?;
    Ok(("", RawArticle {
        headers,
        body: input.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_command_simple() {
        let (_, cmd) = parse_command("ARTICLE").unwrap();
        assert_eq!(cmd.name, "ARTICLE");
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn parse_command_args_preserve_case() {
        let (_, cmd) = parse_command("group comp.lang.Rust").unwrap();
        assert_eq!(cmd.name, "GROUP");
        assert_eq!(cmd.args, vec!["comp.lang.Rust"]);
    }

    #[test]
    fn parse_command_multiple_args() {
        let (_, cmd) = parse_command("NEWNEWS *.* 20240601 000000 GMT").unwrap();
        assert_eq!(cmd.args, vec!["*.*", "20240601", "000000", "GMT"]);
    }

    #[test]
    fn parse_article_headers_and_body() {
        let input = "Subject: Test\r\nFrom: user@example.com\r\n\r\nThis is the body.";
        let (_, article) = parse_article(input).unwrap();
        assert_eq!(article.headers.len(), 2);
        assert_eq!(article.headers[0], ("Subject".into(), "Test".into()));
        assert_eq!(article.body, "This is the body.");
    }

    #[test]
    fn parse_article_folded_header() {
        let input = concat!(
            "Subject: A first",
            "\r\n",
            "\tcontinued",
            "\r\n",
            "\r\n",
            "Body"
        );
        let (_, article) = parse_article(input).unwrap();
        assert_eq!(article.headers[0], ("Subject".into(), "A first continued".into()));
        assert_eq!(article.body, "Body");
    }

    #[test]
    fn parse_article_empty_body() {
        let input = "From: a@b\r\n\r\n";
        let (_, article) = parse_article(input).unwrap();
        assert_eq!(article.body, "");
    }
}
