//! Pipeline Tests
//!
//! End-to-end runs of scripts against temporary workspaces.

use pretty_assertions::assert_eq;
use rf_core::prelude::*;
use rf_core::TRACE;
use rf_test_utils::{SharedBuffer, TempWorkspace};
use rf_workspace::LoadError;

fn write_session() -> Session {
    Session::new(Mode::Write)
        .with_stdout(SharedBuffer::new())
        .with_stderr(SharedBuffer::new())
}

fn diff_session(out: &SharedBuffer) -> Session {
    Session::new(Mode::Diff)
        .with_stdout(out.clone())
        .with_stderr(SharedBuffer::new())
}

fn run(ws: &TempWorkspace, session: Session, script: &str) -> Result<RunSummary, PipelineError> {
    Pipeline::new(session).run(Workspace::open(ws.path()), script)
}

const RENAME_SRC: &str = "fn old() {}\n\nfn main() {\n    old();\n}\n";

// -- Success paths --

#[test]
fn empty_script_does_no_io() {
    let workspace = Workspace::open("/this/workspace/does/not/exist");
    let summary = Pipeline::new(write_session())
        .run(workspace, "# nothing to do\n\n   \n")
        .unwrap();
    assert_eq!(summary, RunSummary::default());
}

#[test]
fn rename_is_written() {
    let ws = TempWorkspace::with_files(&[("lib.rs", RENAME_SRC)]);
    let summary = run(&ws, write_session(), "mv old new\n").unwrap();

    assert_eq!(summary.commands, 1);
    assert_eq!(summary.written, vec![std::path::PathBuf::from("lib.rs")]);
    assert_eq!(ws.read("lib.rs"), "fn new() {}\n\nfn main() {\n    new();\n}\n");
}

#[test]
fn diff_mode_leaves_disk_alone() {
    let ws = TempWorkspace::with_files(&[("lib.rs", RENAME_SRC)]);
    let out = SharedBuffer::new();
    let summary = run(&ws, diff_session(&out), "mv old new").unwrap();

    assert!(summary.diffed);
    assert!(summary.written.is_empty());
    assert_eq!(ws.read("lib.rs"), RENAME_SRC);
    assert_eq!(
        out.contents(),
        "--- a/lib.rs\n+++ b/lib.rs\n@@ -1,5 +1,5 @@\n-fn old() {}\n+fn new() {}\n \n fn main() {\n-    old();\n+    new();\n }\n"
    );
}

#[test]
fn commands_chain_through_snapshots() {
    let ws = TempWorkspace::with_files(&[("lib.rs", "fn a() {}\nfn b() {}\nfn c() {}\n")]);
    let script = "\
# clean up
rm a   # first
mv b renamed
";
    let summary = run(&ws, write_session(), script).unwrap();
    assert_eq!(summary.commands, 2);
    assert_eq!(ws.read("lib.rs"), "fn renamed() {}\nfn c() {}\n");
}

#[test]
fn continued_line_is_one_command() {
    let ws = TempWorkspace::with_files(&[("lib.rs", "fn a() {}\nfn b() {}\nfn c() {}\n")]);
    let summary = run(&ws, write_session(), "rm a \\\n   b\n").unwrap();
    assert_eq!(summary.commands, 1);
    assert_eq!(ws.read("lib.rs"), "fn c() {}\n");
}

#[test]
fn rename_field_and_its_uses() {
    let src = "\
struct Server {
    addr: String,
}

impl Server {
    fn run(&self) -> usize {
        self.addr.len()
    }
}

fn main() {
    let s = Server { addr: String::new() };
    s.run();
}
";
    let ws = TempWorkspace::with_files(&[("main.rs", src)]);
    run(&ws, write_session(), "mv Server.addr Server.address").unwrap();
    assert_eq!(ws.read("main.rs"), src.replace("addr", "address"));
}

#[test]
fn add_after_declaration_and_to_new_file() {
    let ws = TempWorkspace::with_files(&[("lib.rs", "fn a() {}\n\nfn z() {}\n")]);
    let script = "add a `fn b() {}`\nadd extra.rs `pub fn e() {}`\n";
    let summary = run(&ws, write_session(), script).unwrap();

    assert_eq!(ws.read("lib.rs"), "fn a() {}\n\nfn b() {}\n\nfn z() {}\n");
    assert_eq!(ws.read("extra.rs"), "pub fn e() {}\n");
    assert_eq!(summary.written.len(), 2);
}

#[test]
fn go_inline_constants() {
    let src = "\
package main

import \"fmt\"

const greeting = \"hello\"

const (
\tlimit = 4 * 1024
\tother = 2
)

func main() {
\tfmt.Println(greeting, limit)
}
";
    let ws = TempWorkspace::with_files(&[("main.go", src)]);
    run(&ws, write_session(), "inline greeting limit").unwrap();
    assert_eq!(
        ws.read("main.go"),
        "\
package main

import \"fmt\"

const (
\tother = 2
)

func main() {
\tfmt.Println(\"hello\", (4 * 1024))
}
"
    );
}

#[test]
fn go_move_to_new_file_in_same_package() {
    let ws = TempWorkspace::with_files(&[(
        "srv/server.go",
        "package srv\n\ntype Server struct{}\n\nfunc Helper() int {\n\treturn 1\n}\n",
    )]);
    let summary = run(&ws, write_session(), "mv Helper srv/helper.go").unwrap();

    assert_eq!(ws.read("srv/server.go"), "package srv\n\ntype Server struct{}\n");
    assert_eq!(
        ws.read("srv/helper.go"),
        "package srv\n\nfunc Helper() int {\n\treturn 1\n}\n"
    );
    assert_eq!(summary.written.len(), 2);
}

#[test]
fn custom_registry() {
    fn touch(ctx: &mut CommandContext<'_>, args: &str) {
        ctx.snapshot.append("touched.rs", format!("// {args}\n"));
    }

    let ws = TempWorkspace::with_files(&[("lib.rs", "fn a() {}\n")]);
    let mut registry = CommandRegistry::new();
    registry.register("touch", touch);

    let mut pipeline = Pipeline::with_registry(write_session(), registry);
    pipeline.run(Workspace::open(ws.path()), "touch hello").unwrap();
    assert_eq!(ws.read("touched.rs"), "// hello\n");

    let err = pipeline
        .run(Workspace::open(ws.path()), "mv a b")
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnknownCommand(name) if name == "mv"));
}

#[test]
fn trace_echoes_commands() {
    let ws = TempWorkspace::with_files(&[("lib.rs", "fn a() {}\nfn b() {}\nfn c() {}\n")]);
    let err = SharedBuffer::new();
    let session = Session::new(Mode::Write)
        .with_stdout(SharedBuffer::new())
        .with_stderr(err.clone());

    let mut pipeline = Pipeline::new(session);
    pipeline
        .run(Workspace::open(ws.path()), "debug trace\nrm a \\\n  b\n")
        .unwrap();

    assert_eq!(err.contents(), "> rm a \\\n  b\n");
    assert!(pipeline.session().debug().is_set(TRACE));
}

#[test]
fn string_literals_survive_normalization() {
    let src = "const BANNER: &str = \"row one   \n\n\n\nrow two\";\n\nfn old() {}\n";
    let ws = TempWorkspace::with_files(&[("lib.rs", src)]);
    run(&ws, write_session(), "mv old new").unwrap();
    assert_eq!(ws.read("lib.rs"), src.replace("old", "new"));
}

#[test]
fn go_raw_strings_survive_normalization() {
    let src = "package main\n\nvar banner = `a  \n\n\n b`\n\nfunc old() {}\n";
    let ws = TempWorkspace::with_files(&[("main.go", src)]);
    run(&ws, write_session(), "mv old new").unwrap();
    assert_eq!(ws.read("main.go"), src.replace("old", "new"));
}

#[test]
fn crlf_files_keep_their_line_endings() {
    let src = "fn old() {}\r\n\r\nfn keep() {}\r\n";
    let ws = TempWorkspace::with_files(&[("lib.rs", src)]);
    let out = SharedBuffer::new();
    run(&ws, diff_session(&out), "mv old new").unwrap();
    assert_eq!(
        out.contents(),
        "--- a/lib.rs\n+++ b/lib.rs\n@@ -1,3 +1,3 @@\n-fn old() {}\r\n+fn new() {}\r\n \r\n fn keep() {}\r\n"
    );

    run(&ws, write_session(), "mv old new").unwrap();
    assert_eq!(ws.read("lib.rs"), "fn new() {}\r\n\r\nfn keep() {}\r\n");
}

// -- Failure paths --

#[test]
fn preexisting_errors_abort_before_dispatch() {
    let ws = TempWorkspace::with_files(&[("lib.rs", "fn broken( {\n")]);
    let err = run(&ws, write_session(), "frob x").unwrap_err();

    assert!(matches!(err, PipelineError::PreexistingErrors { .. }));
    assert!(!err.diagnostics().is_empty());
    assert_eq!(ws.read("lib.rs"), "fn broken( {\n");
}

#[test]
fn unknown_command_persists_nothing() {
    let ws = TempWorkspace::with_files(&[("lib.rs", "fn a() {}\n")]);
    let err = run(&ws, write_session(), "mv a b\nfrob x\n").unwrap_err();

    assert_eq!(err.to_string(), "unknown command frob");
    assert_eq!(ws.read("lib.rs"), "fn a() {}\n");
}

#[test]
fn handler_errors_name_the_command() {
    let ws = TempWorkspace::with_files(&[("lib.rs", "fn a() {}\n")]);
    let err = run(&ws, write_session(), "rm nothere").unwrap_err();

    assert_eq!(err.to_string(), "errors found while executing: rm nothere");
    assert_eq!(err.diagnostics()[0].message, "cannot find nothere");
}

#[test]
fn rename_onto_existing_name_fails_synchronously() {
    let ws = TempWorkspace::with_files(&[("lib.rs", "fn a() {}\nfn b() {}\n")]);
    let err = run(&ws, write_session(), "mv a b").unwrap_err();
    assert!(matches!(err, PipelineError::SynchronousHandlerError { .. }));
    assert!(err.diagnostics()[0].message.contains("b already declared"));
}

#[test]
fn broken_command_is_blamed_and_last_good_state_written() {
    let ws = TempWorkspace::with_files(&[("lib.rs", "fn a() {}\n")]);
    let script = "mv a b\nadd b `fn b() {}`\nrm b\n";
    let err = run(&ws, write_session(), script).unwrap_err();

    assert_eq!(
        err.to_string(),
        "errors found after executing: add b `fn b() {}`"
    );
    assert!(err.diagnostics()[0].message.contains("function b redeclared"));
    // the rename survived, the duplicate did not
    assert_eq!(ws.read("lib.rs"), "fn b() {}\n");
}

#[test]
fn broken_command_in_diff_mode_shows_last_good_state() {
    let ws = TempWorkspace::with_files(&[("lib.rs", "fn a() {}\n")]);
    let out = SharedBuffer::new();
    let script = "mv a b\nadd b \\\n `fn b() {}`\nrm b\n";
    let err = run(&ws, diff_session(&out), script).unwrap_err();

    assert_eq!(err.command(), Some("add b \\ ..."));
    assert_eq!(out.contents(), "--- a/lib.rs\n+++ b/lib.rs\n@@ -1 +1 @@\n-fn a() {}\n+fn b() {}\n");
    assert_eq!(ws.read("lib.rs"), "fn a() {}\n");
}

#[test]
fn final_check_blocks_write() {
    let ws = TempWorkspace::with_files(&[("lib.rs", "fn a() {}\n")]);
    let err = run(&ws, write_session(), "add a `fn a() {}`").unwrap_err();

    assert!(matches!(err, PipelineError::FinalValidationFailed { .. }));
    assert_eq!(err.diagnostics().len(), 1);
    assert_eq!(ws.read("lib.rs"), "fn a() {}\n");
}

#[test]
fn final_check_in_diff_mode_still_shows_diff() {
    let ws = TempWorkspace::with_files(&[("lib.rs", "fn a() {}\n")]);
    let out = SharedBuffer::new();
    let err = run(&ws, diff_session(&out), "add a `fn a() {}`").unwrap_err();

    assert!(matches!(err, PipelineError::FinalValidationFailed { .. }));
    assert!(out.contents().contains("+fn a() {}\n"));
}

#[test]
fn load_failure_is_fatal() {
    let ws = TempWorkspace::with_files(&[("README.md", "# no sources\n")]);
    let err = run(&ws, write_session(), "rm a").unwrap_err();
    assert!(matches!(err, PipelineError::Load(LoadError::NoSources(_))));
}

#[test]
fn handler_error_late_in_script_leaves_disk_alone() {
    let ws = TempWorkspace::with_files(&[("lib.rs", "fn a() {}\n")]);
    let err = run(&ws, write_session(), "mv a b\nrm missing\n").unwrap_err();

    assert!(matches!(err, PipelineError::SynchronousHandlerError { .. }));
    assert_eq!(err.command(), Some("rm missing"));
    assert_eq!(ws.read("lib.rs"), "fn a() {}\n");
}

#[test]
fn final_reload_failure_blocks_write() {
    fn note(ctx: &mut CommandContext<'_>, _: &str) {
        ctx.snapshot.append("notes.txt", "hello\n");
    }

    let ws = TempWorkspace::with_files(&[("lib.rs", "fn a() {}\n")]);
    let mut registry = CommandRegistry::new();
    registry.register("note", note);

    let err = Pipeline::with_registry(write_session(), registry)
        .run(Workspace::open(ws.path()), "note")
        .unwrap_err();
    assert!(matches!(err, PipelineError::FinalValidationFailed { .. }));
    assert!(err.diagnostics().is_empty());
    assert!(err.to_string().contains("notes.txt"));
    assert!(!ws.exists("notes.txt"));
}

#[test]
fn broken_command_is_blamed_before_unknown_command() {
    let ws = TempWorkspace::with_files(&[("lib.rs", "fn a() {}\n")]);
    let err = run(&ws, write_session(), "add a `fn a() {}`\nfrob x\n").unwrap_err();

    assert!(matches!(err, PipelineError::CommandIntroducedErrors { .. }));
    assert_eq!(err.command(), Some("add a `fn a() {}`"));
    assert_eq!(ws.read("lib.rs"), "fn a() {}\n");
}

#[test]
fn add_refuses_files_outside_the_workspace() {
    let ws = TempWorkspace::with_files(&[
        ("lib.rs", "fn a() {}\n"),
        ("testdata/keep.rs", "fn precious() {}\n"),
    ]);
    let err = run(&ws, write_session(), "add testdata/keep.rs `fn extra() {}`").unwrap_err();

    assert!(matches!(err, PipelineError::SynchronousHandlerError { .. }));
    assert_eq!(
        err.diagnostics()[0].message,
        "testdata/keep.rs: file exists but is not part of the workspace"
    );
    assert_eq!(ws.read("testdata/keep.rs"), "fn precious() {}\n");

    let err = run(&ws, write_session(), "mv a testdata/keep.rs").unwrap_err();
    assert!(matches!(err, PipelineError::SynchronousHandlerError { .. }));
    assert_eq!(ws.read("testdata/keep.rs"), "fn precious() {}\n");
    assert_eq!(ws.read("lib.rs"), "fn a() {}\n");
}

#[test]
fn file_arguments_cannot_leave_the_root() {
    let ws = TempWorkspace::with_files(&[("inner/lib.rs", "fn a() {}\n")]);
    let inner = Workspace::open(ws.join("inner"));
    let err = Pipeline::new(write_session())
        .run(inner, "add ../escaped.rs `fn e() {}`")
        .unwrap_err();

    assert!(matches!(err, PipelineError::SynchronousHandlerError { .. }));
    assert!(!ws.exists("escaped.rs"));

    let inner = Workspace::open(ws.join("inner"));
    let err = Pipeline::new(write_session())
        .run(inner, "mv a /tmp/escaped.rs")
        .unwrap_err();
    assert!(matches!(err, PipelineError::SynchronousHandlerError { .. }));
    assert_eq!(ws.read("inner/lib.rs"), "fn a() {}\n");
}

#[test]
fn nested_declarations_cannot_move_to_a_file() {
    let ws = TempWorkspace::with_files(&[("lib.rs", "struct Server {\n    addr: String,\n}\n")]);
    let err = run(&ws, write_session(), "mv Server.addr other.rs").unwrap_err();

    assert!(matches!(err, PipelineError::SynchronousHandlerError { .. }));
    assert!(err.diagnostics()[0].message.ends_with("(declared in Server)"));
    assert!(!ws.exists("other.rs"));
}
