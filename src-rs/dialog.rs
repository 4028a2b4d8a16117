pub const ERROR_TITLE: &str = "Error";
pub const DONE_TITLE: &str = "Done";

/// Modal messages shown to the user.
pub trait Dialogs {
    /// `message` may contain an HTML hyperlink.
    fn error(&mut self, title: &str, message: &str);

    fn alert(&mut self, title: &str, body: &str);
}

/// Terminal stand-in for host dialogs: errors go to stderr, alerts to stdout.
#[derive(Debug, Default)]
pub struct ConsoleDialogs;

impl Dialogs for ConsoleDialogs {
    fn error(&mut self, title: &str, message: &str) {
        eprintln!("{title}: {}", strip_links(message));
    }

    fn alert(&mut self, title: &str, body: &str) {
        println!("{title}");
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            println!("  {line}");
        }
    }
}

/// Renders `<a href="url">text</a>` as `text (url)` for plain terminals.
pub fn strip_links(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    let mut rest = message;
    while let Some(start) = rest.find("<a href=\"") {
        out.push_str(&rest[..start]);
        let after = &rest[start + "<a href=\"".len()..];
        let parsed = after.find('"').and_then(|url_end| {
            let url = &after[..url_end];
            let tail = &after[url_end..];
            let text_start = tail.find('>')? + 1;
            let text_end = tail.find("</a>")?;
            (text_start <= text_end).then(|| {
                (
                    url,
                    &tail[text_start..text_end],
                    &tail[text_end + "</a>".len()..],
                )
            })
        });
        match parsed {
            Some((url, text, remainder)) => {
                out.push_str(&format!("{text} ({url})"));
                rest = remainder;
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MISSING_API_KEY_MESSAGE;

    #[test]
    fn links_become_text_with_url() {
        assert_eq!(
            strip_links(MISSING_API_KEY_MESSAGE),
            "Missing Google Static Maps API key. Generate one! (https://developers.google.com/maps/documentation/maps-static/get-api-key)"
        );
    }

    #[test]
    fn plain_and_unterminated_messages_pass_through() {
        assert_eq!(strip_links("plain"), "plain");
        assert_eq!(strip_links("see <a href=\"x"), "see <a href=\"x");
    }
}
