//! Unified diff parser (`git diff`, `gh pr diff`, `diff -u`).
//!
//! Line-driven state machine. `diff --git` always opens a new file entry, so
//! a malformed hunk can at worst miscount its own file. Once the accumulated
//! input passes the byte ceiling, hunk lines are still walked (so their
//! bodies are never mistaken for headers) but no longer counted, and later
//! file headers still register their files.

use super::classify::failure_for;
use super::ParseOptions;
use crate::output::RawInvocation;
use crate::record::{DiffChunk, DiffFileEntry, DiffReport, DiffStatus};
use regex::Regex;
use std::sync::LazyLock;

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Outside any file, or after a file's last hunk.
    BetweenFiles,
    /// After `diff --git` / `---`, before the first hunk.
    FileHeader,
    /// Inside a hunk; remaining old/new lines.
    HunkBody { old_left: u32, new_left: u32 },
}

struct DiffParser {
    files: Vec<DiffFileEntry>,
    state: State,
    consumed: usize,
    ceiling: usize,
    truncated: bool,
}

/// Parse a unified diff from a `git diff`, `gh pr diff` or `diff -u` run.
///
/// `diff -u` and `git diff --exit-code` exit 1 when the inputs differ, so
/// exit 1 with an empty stderr still counts as success.
pub fn parse_diff(raw: &RawInvocation, opts: &ParseOptions) -> DiffReport {
    let differs = raw.exit_code == 1 && raw.stderr.trim().is_empty();
    let success = raw.success() || differs;

    let mut report = parse_diff_text(&raw.stdout, opts);
    report.success = success;
    report.error_type = if success {
        None
    } else {
        failure_for(raw.exit_code, &raw.stderr)
    };
    report
}

fn parse_diff_text(text: &str, opts: &ParseOptions) -> DiffReport {
    let mut parser = DiffParser {
        files: Vec::new(),
        state: State::BetweenFiles,
        consumed: 0,
        ceiling: opts.limits.diff_byte_ceiling,
        truncated: false,
    };
    for line in text.lines() {
        parser.feed(line);
    }
    parser.finish()
}

impl DiffParser {
    fn feed(&mut self, line: &str) {
        self.consumed += line.len() + 1;
        if !self.truncated && self.consumed > self.ceiling {
            self.truncated = true;
            tracing::warn!(
                ceiling = self.ceiling,
                files = self.files.len(),
                "Diff exceeds byte ceiling; hunks no longer counted"
            );
        }

        if let Some(rest) = line.strip_prefix("diff --git ") {
            let (_, new_path) = git_header_paths(rest);
            self.files.push(DiffFileEntry {
                file: new_path,
                ..DiffFileEntry::default()
            });
            self.state = State::FileHeader;
            return;
        }

        match self.state {
            State::HunkBody { old_left, new_left } => self.hunk_line(line, old_left, new_left),
            State::BetweenFiles | State::FileHeader => self.header_line(line),
        }
    }

    fn hunk_line(&mut self, line: &str, old_left: u32, new_left: u32) {
        let (old_left, new_left) = match line.as_bytes().first().copied() {
            Some(b'+') => {
                if !self.truncated {
                    self.count(|c| c.additions += 1, |f| f.additions += 1);
                }
                (old_left, new_left.saturating_sub(1))
            }
            Some(b'-') => {
                if !self.truncated {
                    self.count(|c| c.deletions += 1, |f| f.deletions += 1);
                }
                (old_left.saturating_sub(1), new_left)
            }
            Some(b' ') | None => (old_left.saturating_sub(1), new_left.saturating_sub(1)),
            Some(b'\\') => (old_left, new_left),
            Some(_) => {
                // Hunk ended early; the line belongs to the headers.
                self.state = State::BetweenFiles;
                self.header_line(line);
                return;
            }
        };
        self.state = if old_left == 0 && new_left == 0 {
            State::BetweenFiles
        } else {
            State::HunkBody { old_left, new_left }
        };
    }

    fn count(&mut self, chunk: impl FnOnce(&mut DiffChunk), file: impl FnOnce(&mut DiffFileEntry)) {
        if let Some(entry) = self.files.last_mut() {
            file(entry);
            if let Some(c) = entry.chunks.as_mut().and_then(|chunks| chunks.last_mut()) {
                chunk(c);
            }
        }
    }

    fn header_line(&mut self, line: &str) {
        if line.starts_with("@@") {
            self.hunk_header(line);
            return;
        }

        if let Some(path) = line.strip_prefix("--- ") {
            if self.state == State::BetweenFiles {
                // Plain `diff -u` output has no `diff --git` line.
                self.files.push(DiffFileEntry {
                    file: side_path(path, "a/"),
                    ..DiffFileEntry::default()
                });
                self.state = State::FileHeader;
            }
            if is_dev_null(path) {
                self.with_current(|f| f.status = DiffStatus::Added);
            }
            return;
        }

        let Some(entry) = self.files.last_mut() else {
            return;
        };

        if let Some(path) = line.strip_prefix("+++ ") {
            if is_dev_null(path) {
                entry.status = DiffStatus::Deleted;
            } else {
                entry.file = side_path(path, "b/");
            }
        } else if let Some(mode) = line.strip_prefix("new file mode ") {
            entry.status = DiffStatus::Added;
            entry.mode = Some(mode.trim().to_string());
        } else if let Some(mode) = line.strip_prefix("deleted file mode ") {
            entry.status = DiffStatus::Deleted;
            entry.mode = Some(mode.trim().to_string());
        } else if let Some(mode) = line.strip_prefix("new mode ") {
            entry.mode = Some(mode.trim().to_string());
        } else if let Some(from) = line.strip_prefix("rename from ") {
            entry.status = DiffStatus::Renamed;
            entry.old_file = Some(unquote(from));
        } else if let Some(to) = line.strip_prefix("rename to ") {
            // Renamed only once the old side is known
            entry.file = unquote(to);
        } else if (line.starts_with("Binary files ") && line.ends_with(" differ"))
            || line == "GIT binary patch"
        {
            entry.binary = true;
            entry.additions = 0;
            entry.deletions = 0;
            entry.chunks = None;
        }
    }

    fn hunk_header(&mut self, line: &str) {
        let Some(caps) = HUNK_HEADER.captures(line) else {
            return;
        };
        let Some(entry) = self.files.last_mut() else {
            return;
        };
        if entry.binary {
            return;
        }

        let num = |i: usize, default: u32| {
            caps.get(i)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(default)
        };
        let chunk = DiffChunk {
            header: line.trim_end().to_string(),
            old_start: num(1, 0),
            old_lines: num(2, 1),
            new_start: num(3, 0),
            new_lines: num(4, 1),
            additions: 0,
            deletions: 0,
        };
        let (old_left, new_left) = (chunk.old_lines, chunk.new_lines);
        if !self.truncated {
            entry.chunks.get_or_insert_with(Vec::new).push(chunk);
        }

        self.state = if old_left == 0 && new_left == 0 {
            State::BetweenFiles
        } else {
            State::HunkBody { old_left, new_left }
        };
    }

    fn with_current(&mut self, f: impl FnOnce(&mut DiffFileEntry)) {
        if let Some(entry) = self.files.last_mut() {
            f(entry);
        }
    }

    fn finish(self) -> DiffReport {
        let total_additions = self.files.iter().map(|f| f.additions).sum();
        let total_deletions = self.files.iter().map(|f| f.deletions).sum();
        DiffReport {
            files_changed: self.files.len(),
            total_additions,
            total_deletions,
            truncated: self.truncated,
            files: self.files,
            success: true,
            error_type: None,
        }
    }
}

fn is_dev_null(path: &str) -> bool {
    path.split('\t').next().map(str::trim) == Some("/dev/null")
}

/// Path from a `---`/`+++` line: quotes removed, trailing timestamp dropped,
/// side prefix stripped.
fn side_path(raw: &str, prefix: &str) -> String {
    let path = if raw.starts_with('"') {
        unquote(raw)
    } else {
        raw.split('\t').next().unwrap_or(raw).trim_end().to_string()
    };
    strip_side(&path, prefix)
}

fn strip_side(path: &str, prefix: &str) -> String {
    path.strip_prefix(prefix).unwrap_or(path).to_string()
}

/// Old and new paths from the text after `diff --git `.
///
/// Unquoted paths may contain spaces. When both sides name the same file
/// the header splits exactly in half; otherwise the last ` b/` is the split.
fn git_header_paths(rest: &str) -> (String, String) {
    let rest = rest.trim_end();

    if rest.starts_with('"') {
        let (a, after) = take_quoted(rest);
        return (strip_side(&a, "a/"), strip_side(&unquote(after.trim_start()), "b/"));
    }
    if let Some(i) = rest.find(" \"") {
        let b = unquote(&rest[i + 1..]);
        return (strip_side(&rest[..i], "a/"), strip_side(&b, "b/"));
    }

    if rest.len() % 2 == 1 {
        let mid = rest.len() / 2;
        if rest.is_char_boundary(mid) && rest.as_bytes()[mid] == b' ' {
            let a = strip_side(&rest[..mid], "a/");
            let b = strip_side(&rest[mid + 1..], "b/");
            if a == b {
                return (a, b);
            }
        }
    }

    match rest.rfind(" b/").or_else(|| rest.rfind(' ')) {
        Some(i) => (strip_side(&rest[..i], "a/"), strip_side(&rest[i + 1..], "b/")),
        None => (strip_side(rest, "a/"), strip_side(rest, "a/")),
    }
}

/// Undo git's C-style path quoting; unquoted text is returned trimmed.
fn unquote(text: &str) -> String {
    let text = text.trim();
    if text.starts_with('"') {
        take_quoted(text).0
    } else {
        text.to_string()
    }
}

/// Read one quoted string starting at `s[0] == '"'`. Returns the decoded
/// string and the text after the closing quote.
fn take_quoted(s: &str) -> (String, &str) {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => return (String::from_utf8_lossy(&out).into_owned(), &s[i + 1..]),
            b'\\' if i + 1 < bytes.len() => {
                let c = bytes[i + 1];
                if (b'0'..=b'7').contains(&c) {
                    let mut value: u32 = 0;
                    let mut j = i + 1;
                    while j < bytes.len() && j < i + 4 && (b'0'..=b'7').contains(&bytes[j]) {
                        value = value * 8 + u32::from(bytes[j] - b'0');
                        j += 1;
                    }
                    out.push(value as u8);
                    i = j;
                    continue;
                }
                out.push(match c {
                    b'n' => b'\n',
                    b't' => b'\t',
                    b'r' => b'\r',
                    other => other,
                });
                i += 2;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    (String::from_utf8_lossy(&out).into_owned(), "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::Limits;
    use crate::record::FailureKind;

    fn parse(text: &str) -> DiffReport {
        parse_diff(&RawInvocation::new(text, "", 0), &ParseOptions::default())
    }

    const MODIFIED: &str = "\
diff --git a/src/main.rs b/src/main.rs
index 83db48f..bf269f4 100644
--- a/src/main.rs
+++ b/src/main.rs
@@ -1,4 +1,5 @@ fn main() {
 use std::io;
-use std::fs;
+use std::fs::File;
+use std::path::Path;

 fn main() {
@@ -10 +11 @@
-    old();
+    new();
";

    #[test]
    fn test_modified_with_two_hunks() {
        let report = parse(MODIFIED);
        assert_eq!(report.files_changed, 1);
        let file = &report.files[0];
        assert_eq!(file.file, "src/main.rs");
        assert_eq!(file.status, DiffStatus::Modified);
        assert_eq!((file.additions, file.deletions), (3, 2));

        let chunks = file.chunks.as_ref().unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].header, "@@ -1,4 +1,5 @@ fn main() {");
        assert_eq!((chunks[0].additions, chunks[0].deletions), (2, 1));
        assert_eq!((chunks[1].old_start, chunks[1].old_lines), (10, 1));
        assert_eq!((chunks[1].new_start, chunks[1].new_lines), (11, 1));
        assert_eq!((report.total_additions, report.total_deletions), (3, 2));
        assert!(!report.truncated);
    }

    #[test]
    fn test_rename_with_spaces() {
        let text = "\
diff --git a/docs/old name.md b/docs/new name.md
similarity index 90%
rename from docs/old name.md
rename to docs/new name.md
index 1111111..2222222 100644
--- a/docs/old name.md
+++ b/docs/new name.md
@@ -1,2 +1,2 @@
 keep
-before
+after
";
        let report = parse(text);
        let file = &report.files[0];
        assert_eq!(file.status, DiffStatus::Renamed);
        assert_eq!(file.file, "docs/new name.md");
        assert_eq!(file.old_file.as_deref(), Some("docs/old name.md"));
        assert_eq!((file.additions, file.deletions), (1, 1));
    }

    #[test]
    fn test_mode_change_path_with_space() {
        let text = "diff --git a/a b.txt b/a b.txt\nold mode 100644\nnew mode 100755\n";
        let file = &parse(text).files[0];
        assert_eq!(file.file, "a b.txt");
        assert_eq!(file.mode.as_deref(), Some("100755"));
        assert_eq!(file.chunks, None);
    }

    #[test]
    fn test_binary_added() {
        let text = "\
diff --git a/assets/logo.png b/assets/logo.png
new file mode 100644
index 0000000..3f4e2a1
Binary files /dev/null and b/assets/logo.png differ
";
        let report = parse(text);
        let file = &report.files[0];
        assert!(file.binary);
        assert_eq!(file.status, DiffStatus::Added);
        assert_eq!(file.mode.as_deref(), Some("100644"));
        assert_eq!((file.additions, file.deletions), (0, 0));
        assert_eq!(file.chunks, None);
    }

    #[test]
    fn test_deleted_file() {
        let text = "\
diff --git a/gone.txt b/gone.txt
deleted file mode 100644
index e69de29..0000000
--- a/gone.txt
+++ /dev/null
@@ -1,2 +0,0 @@
-one
-two
";
        let file = &parse(text).files[0];
        assert_eq!(file.status, DiffStatus::Deleted);
        assert_eq!(file.file, "gone.txt");
        assert_eq!(file.deletions, 2);
    }

    #[test]
    fn test_quoted_path() {
        let text = "diff --git \"a/caf\\303\\251 menu.txt\" \"b/caf\\303\\251 menu.txt\"\nnew file mode 100644\n";
        let file = &parse(text).files[0];
        assert_eq!(file.file, "café menu.txt");
    }

    #[test]
    fn test_body_lines_resembling_headers_are_counted() {
        let text = "\
diff --git a/notes.md b/notes.md
--- a/notes.md
+++ b/notes.md
@@ -1,1 +1,2 @@
--- a/quoted
+++ b/quoted
+more
";
        let file = &parse(text).files[0];
        assert_eq!((file.additions, file.deletions), (2, 1));
    }

    #[test]
    fn test_plain_unified_diff() {
        let text = "--- a.txt\t2024-01-01 00:00:00\n+++ b.txt\t2024-01-02 00:00:00\n@@ -1 +1 @@\n-x\n+y\n";
        let report = parse(text);
        assert_eq!(report.files_changed, 1);
        assert_eq!(report.files[0].file, "b.txt");
        assert_eq!(report.total_additions, 1);
    }

    #[test]
    fn test_byte_ceiling_keeps_registering_files() {
        let mut text = String::from(MODIFIED);
        text.push_str("diff --git a/late.rs b/late.rs\nnew file mode 100644\n--- /dev/null\n+++ b/late.rs\n@@ -0,0 +1,2 @@\n+a\n+b\n");
        let opts = ParseOptions::new(Limits::default().with_diff_byte_ceiling(MODIFIED.len()));

        let report = parse_diff(&RawInvocation::new(text, "", 0), &opts);
        assert!(report.truncated);
        assert_eq!(report.files_changed, 2);
        assert_eq!(report.files[0].additions, 3);
        assert_eq!(report.files[1].file, "late.rs");
        assert_eq!(report.files[1].status, DiffStatus::Added);
        assert_eq!(report.files[1].additions, 0);
        assert_eq!(report.files[1].chunks, None);
    }

    #[test]
    fn test_empty_and_garbage() {
        let empty = parse("");
        assert!(empty.files.is_empty());
        assert!(empty.success);
        assert_eq!(parse("fatal: not a git repository").files_changed, 0);
    }

    #[test]
    fn test_body_after_ceiling_never_rewrites_headers() {
        let first = "diff --git a/a.md b/a.md\n--- a/a.md\n+++ b/a.md\n@@ -1 +1 @@\n-x\n+y\n";
        let second = "diff --git a/b.md b/b.md\n--- a/b.md\n+++ b/b.md\n@@ -1,2 +1,3 @@\n keep\n-old\n+++ evil\n+--- worse\n";
        let text = format!("{first}{second}");
        let opts = ParseOptions::new(Limits::default().with_diff_byte_ceiling(20));

        let report = parse_diff(&RawInvocation::new(text, "", 0), &opts);
        assert!(report.truncated);
        assert_eq!(report.files_changed, 2);
        assert_eq!(report.files[1].file, "b.md");
        assert_eq!(report.files[1].status, DiffStatus::Modified);
        assert_eq!(report.files[1].additions, 0);
    }

    #[test]
    fn test_lone_rename_to_is_not_a_rename() {
        let file = &parse("diff --git a/x b/y\nrename to y\n").files[0];
        assert_eq!(file.file, "y");
        assert_eq!(file.status, DiffStatus::Modified);
        assert_eq!(file.old_file, None);
    }

    #[test]
    fn test_exit_status() {
        // diff -u exits 1 when the files differ
        let report = parse_diff(
            &RawInvocation::new("--- a\n+++ b\n@@ -1 +1 @@\n-x\n+y\n", "", 1),
            &ParseOptions::default(),
        );
        assert!(report.success);
        assert_eq!(report.error_type, None);
        assert_eq!(report.files_changed, 1);

        let report = parse_diff(
            &RawInvocation::new("", "fatal: not a git repository (or any of the parent directories): .git\n", 128),
            &ParseOptions::default(),
        );
        assert!(!report.success);
        assert_eq!(report.error_type, Some(FailureKind::Unknown));

        let report = parse_diff(
            &RawInvocation::new("", "GraphQL: Could not resolve to a PullRequest (not found)\n", 1),
            &ParseOptions::default(),
        );
        assert!(!report.success);
        assert_eq!(report.error_type, Some(FailureKind::NotFound));
    }

    #[test]
    fn test_git_header_paths() {
        assert_eq!(
            git_header_paths("a/x.rs b/y.rs"),
            ("x.rs".to_string(), "y.rs".to_string())
        );
        assert_eq!(
            git_header_paths("a/my file b/my file"),
            ("my file".to_string(), "my file".to_string())
        );
    }
}
