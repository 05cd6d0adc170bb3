//! Script tokenizer
//!
//! A script is a sequence of lines, one command per logical line:
//!
//! ```text
//! # comments run to end of line, except inside quotes
//! mv Server.addr Server.address
//! add Server `fn close(&self) {}`
//! rm oldHelper \
//!    otherHelper
//! ```

/// One logical command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCommand {
    /// First word of the line
    pub name: String,
    /// Rest of the line after the name
    pub args: String,
    /// Full logical line, continuation newlines included
    pub text: String,
    /// 1-based physical line the command starts on
    pub line: usize,
}

impl ScriptCommand {
    /// Whether the command spans more than one physical line
    #[inline]
    #[must_use]
    pub fn is_multiline(&self) -> bool {
        self.text.contains('\n')
    }

    /// First physical line, marked with ` \ ...` when more follow
    #[must_use]
    pub fn summary(&self) -> String {
        match self.text.split_once('\n') {
            Some((first, _)) => format!("{} \\ ...", first.trim_end()),
            None => self.text.clone(),
        }
    }

    /// The command as echoed by tracing, continuations written back as `\`
    #[must_use]
    pub fn trace_line(&self) -> String {
        self.text.replace('\n', "\\\n")
    }
}

/// Split script text into commands
///
/// Comments are stripped before a trailing `\` is looked at, and again
/// after every join, so `#` inside a continued quote is still protected.
#[must_use]
pub fn parse_script(script: &str) -> Vec<ScriptCommand> {
    let mut commands = Vec::new();
    let mut rest = script;
    let mut line_no = 0;

    while !rest.is_empty() {
        let (raw, after) = cut_line(rest);
        rest = after;
        line_no += 1;
        let start = line_no;

        let mut line = trim_comments(raw).to_string();
        while line.ends_with('\\') && !rest.is_empty() {
            let (next, after) = cut_line(rest);
            rest = after;
            line_no += 1;
            line.pop();
            line.push('\n');
            line.push_str(next);
            line = trim_comments(&line).to_string();
        }

        let line = line.trim_start_matches([' ', '\t', '\n']);
        if line.is_empty() {
            continue;
        }
        let (name, args) = match line.find(char::is_whitespace) {
            Some(i) => (&line[..i], line[i..].trim_start()),
            None => (line, ""),
        };
        commands.push(ScriptCommand {
            name: name.to_string(),
            args: args.to_string(),
            text: line.to_string(),
            line: start,
        });
    }

    commands
}

fn cut_line(text: &str) -> (&str, &str) {
    text.split_once('\n').unwrap_or((text, ""))
}

/// Cut `line` at the first `#` outside quotes and trim it
///
/// Quotes are `'`, `"` and `` ` ``. A backslash escapes the next byte
/// inside `'` and `"` only. Other quote characters inside an open quote
/// are literal.
#[must_use]
pub fn trim_comments(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut quote: Option<u8> = None;
    let mut end = bytes.len();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        match quote {
            Some(q) if c == q => quote = None,
            Some(b'\'' | b'"') if c == b'\\' => i += 1,
            Some(_) => {}
            None => match c {
                b'\'' | b'"' | b'`' => quote = Some(c),
                b'#' => {
                    end = i;
                    break;
                }
                _ => {}
            },
        }
        i += 1;
    }

    line[..end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names_and_args(script: &str) -> Vec<(String, String)> {
        parse_script(script)
            .into_iter()
            .map(|c| (c.name, c.args))
            .collect()
    }

    fn pair(name: &str, args: &str) -> (String, String) {
        (name.to_string(), args.to_string())
    }

    #[test]
    fn comments_and_blank_lines() {
        assert_eq!(
            names_and_args("mv a b\nrm c  # comment\n"),
            vec![pair("mv", "a b"), pair("rm", "c")]
        );
        assert!(names_and_args("\n\n   \n# only a comment\n").is_empty());
    }

    #[test]
    fn quoted_hash_is_not_a_comment() {
        assert_eq!(names_and_args("add `x#y`\n"), vec![pair("add", "`x#y`")]);
        assert_eq!(names_and_args("add \"a#b\" # c"), vec![pair("add", "\"a#b\"")]);
        assert_eq!(names_and_args("add 'a\\'#b'"), vec![pair("add", "'a\\'#b'")]);
    }

    #[test]
    fn backtick_ignores_backslash() {
        assert_eq!(trim_comments("add `a\\` # c"), "add `a\\`");
    }

    #[test]
    fn other_quotes_inside_quote_are_literal() {
        assert_eq!(trim_comments("add \"it's # here\" # gone"), "add \"it's # here\"");
        assert_eq!(trim_comments("add `say \"hi\" # x` # y"), "add `say \"hi\" # x`");
    }

    #[test]
    fn unterminated_quote_protects_rest() {
        assert_eq!(trim_comments("add \"open # still quoted"), "add \"open # still quoted");
    }

    #[test]
    fn continuation_joins_lines() {
        let commands = parse_script("rm a \\\n  b\nmv c d\n");
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].name, "rm");
        assert_eq!(commands[0].args, "a \n  b");
        assert_eq!(commands[0].line, 1);
        assert!(commands[0].is_multiline());
        assert_eq!(commands[0].summary(), "rm a \\ ...");
        assert_eq!(commands[0].trace_line(), "rm a \\\n  b");
        assert_eq!(commands[1].line, 3);
        assert_eq!(commands[1].summary(), "mv c d");
    }

    #[test]
    fn comment_stripped_before_continuation_check() {
        // the backslash is inside the comment, so no join
        let commands = parse_script("rm a # not a continuation \\\nrm b\n");
        assert_eq!(commands.len(), 2);
    }

    #[test]
    fn continuation_restrips_comments() {
        let commands = parse_script("add X `a \\\n b` # done\n");
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].args, "X `a \n b`");
    }

    #[test]
    fn trailing_backslash_at_end_of_script() {
        let commands = parse_script("rm a \\");
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].args, "a \\");

        let commands = parse_script("rm a \\\n");
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].args, "a \\");
    }

    #[test]
    fn name_split_at_first_whitespace() {
        let commands = parse_script("  debug\ttrace=1   other\n");
        assert_eq!(commands[0].name, "debug");
        assert_eq!(commands[0].args, "trace=1   other");
        assert_eq!(commands[0].text, "debug\ttrace=1   other");

        let commands = parse_script("inline\n");
        assert_eq!(commands[0].args, "");
    }
}
