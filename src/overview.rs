//! Overview line formatting for OVER/XOVER (RFC 2980) and the
//! `LIST OVERVIEW.FMT` command.

use crate::article::Article;
use crate::wire::ArticleNumber;

/// Field order reported by `LIST OVERVIEW.FMT`, matching the order
/// overview lines are generated in.
pub const OVERVIEW_FORMAT: &[&str] = &[
    "Subject:",
    "From:",
    "Date:",
    "Message-ID:",
    "References:",
    ":bytes",
    ":lines",
];

/// Replace CR, LF, and TAB with a single space so a header value can
/// never smuggle in an extra field or corrupt line framing.
fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '\r' || c == '\n' || c == '\t' { ' ' } else { c })
        .collect()
}

/// Render one tab-separated overview line for `article` as it is known
/// under `number` (0 when resolved by Message-ID outside the current
/// group, per §4.11).
#[must_use]
pub fn overview_line(number: ArticleNumber, article: &Article) -> String {
    let subject = sanitize(article.headers.first("subject").unwrap_or(""));
    let from = sanitize(article.headers.first("from").unwrap_or(""));
    let date = sanitize(article.headers.first("date").unwrap_or(""));
    let message_id = sanitize(article.message_id.as_str());
    let references = sanitize(&article.headers.all("references").join(" "));
    let bytes = article.body.len();
    let lines = article.body.lines().count();

    format!("{number}\t{subject}\t{from}\t{date}\t{message_id}\t{references}\t{bytes}\t{lines}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::ArticleHeaders;
    use crate::wire::MessageId;

    fn sample_article() -> Article {
        let mut headers = ArticleHeaders::new();
        headers.set("Subject", "hello\tworld".into());
        headers.set("From", "a@b".into());
        headers.set("Date", "20240601123456".into());
        Article {
            message_id: MessageId::parse("<a@b>").unwrap(),
            headers,
            body: "line one\nline two\n".into(),
        }
    }

    #[test]
    fn overview_line_has_eight_tab_separated_fields() {
        let line = overview_line(1, &sample_article());
        assert_eq!(line.matches('\t').count(), 7);
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields.len(), 8);
        assert_eq!(fields[0], "1");
        assert_eq!(fields[1], "hello world");
    }

    #[test]
    fn missing_optional_fields_are_empty() {
        let mut headers = ArticleHeaders::new();
        headers.set("Subject", "s".into());
        let article = Article {
            message_id: MessageId::parse("<x@y>").unwrap(),
            headers,
            body: String::new(),
        };
        let line = overview_line(0, &article);
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields[2], ""); // From
        assert_eq!(fields[5], ""); // References
    }
}
