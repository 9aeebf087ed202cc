use anyhow::{bail, Context, Result};

/// One replacement script: requests matching `pattern` are answered with `body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surrogate {
    pub pattern: String,
    pub mime: String,
    pub body: String,
}

/// Parse the surrogates feed: blank-line separated blocks whose first line is
/// `<pattern> <mime-type>` followed by the script body. `#` lines are comments.
pub fn parse(data: &[u8]) -> Result<Vec<Surrogate>> {
    let text = std::str::from_utf8(data).context("surrogates are not utf-8")?;
    let mut out = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    // `lines()` strips `\r`, so CRLF feeds split the same way
    for line in text.lines().chain(std::iter::once("")) {
        if line.trim().is_empty() {
            if let Some(rule) = rule_from_block(&block)? {
                out.push(rule);
            }
            block.clear();
        } else if !line.trim_start().starts_with('#') {
            block.push(line);
        }
    }
    if out.is_empty() {
        bail!("no surrogates found");
    }
    Ok(out)
}

fn rule_from_block(block: &[&str]) -> Result<Option<Surrogate>> {
    let Some((header, body)) = block.split_first() else { return Ok(None) };
    let Some((pattern, mime)) = header.trim().split_once(' ') else {
        bail!("malformed surrogate header: {header}");
    };
    Ok(Some(Surrogate {
        pattern: pattern.to_string(),
        mime: mime.trim().to_string(),
        body: body.join("\n"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_blocks() {
        let data = b"# header comment\ntracker.com/analytics.js application/javascript\n(function(){})();\n\nads.net/tag.js application/javascript\nwindow.ads = {};\n";
        let rules = parse(data).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].pattern, "tracker.com/analytics.js");
        assert_eq!(rules[0].mime, "application/javascript");
        assert_eq!(rules[0].body, "(function(){})();");
        assert_eq!(rules[1].pattern, "ads.net/tag.js");
    }

    #[test]
    fn crlf_blocks_split_like_lf() {
        let data = b"tracker.com/a.js application/javascript\r\nvar a;\r\n\r\nads.net/b.js application/javascript\r\nvar b;\r\n";
        let rules = parse(data).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].body, "var a;");
        assert_eq!(rules[1].pattern, "ads.net/b.js");
        assert_eq!(rules[1].body, "var b;");
    }

    #[test]
    fn empty_or_malformed_is_rejected() {
        assert!(parse(b"\n\n# only comments\n").is_err());
        assert!(parse(b"no-mime-type\nbody").is_err());
        assert!(parse(&[0xff, 0xfe]).is_err());
    }
}
