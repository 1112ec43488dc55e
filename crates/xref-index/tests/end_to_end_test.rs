//! Index several overlapping TUs in parallel, then render the result.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use xref_core::{Link, Markup, PathMap, SimpleTemplate, XrefIndex};
use xref_index::{
    index_units, CursorRecord, DumpIndex, IncludeRecord, IndexStats, LocationRecord, TokenRecord,
    TuDump,
};

const UTIL_H: &str = "int util(int);\n";
const UTIL_C: &str = "#include \"util.h\"\nint util(int x) { return x; }\n";
const MAIN_C: &str =
    "#include \"util.h\"\n#include <stdio.h>\nint main() { printf(\"x\"); return util(1); }\n";

fn offset(text: &str, needle: &str) -> u32 {
    text.find(needle).unwrap() as u32
}

fn span(text: &str, needle: &str) -> (u32, u32) {
    let begin = offset(text, needle);
    (begin, begin + needle.len() as u32)
}

fn util_h_declaration() -> CursorRecord {
    CursorRecord {
        file: 1,
        line: 1,
        offset: 4,
        end: 8,
        spelling: "util".into(),
        usr: Some("c:@F@util".into()),
        kind: Some("function".into()),
        ..CursorRecord::default()
    }
}

fn include(file: usize, text: &str, directive: &str, target: usize) -> IncludeRecord {
    let (begin, end) = span(text, directive);
    IncludeRecord {
        file,
        begin,
        end,
        target,
    }
}

struct Fixture {
    _tmp: TempDir,
    src: PathBuf,
    out: PathBuf,
    units: Vec<PathBuf>,
}

fn write_dump(dir: &Path, name: &str, dump: &TuDump) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(dump).unwrap()).unwrap();
    path
}

fn fixture() -> Fixture {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().canonicalize().unwrap();
    let src = root.join("src");
    let out = root.join("out");
    let dumps = root.join("dumps");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir_all(&dumps).unwrap();
    fs::write(src.join("util.h"), UTIL_H).unwrap();
    fs::write(src.join("util.c"), UTIL_C).unwrap();
    fs::write(src.join("main.c"), MAIN_C).unwrap();

    let (printf_begin, printf_end) = span(MAIN_C, "printf");
    let (call_begin, call_end) = span(MAIN_C, "util(1)");
    let main_dump = TuDump {
        name: Some("main.c".into()),
        files: vec![
            src.join("main.c"),
            src.join("util.h"),
            PathBuf::from("/nonexistent/usr/include/stdio.h"),
        ],
        tokens: vec![TokenRecord {
            file: 0,
            begin: offset(MAIN_C, "int main"),
            end: offset(MAIN_C, "int main") + 3,
            kind: "keyword".into(),
        }],
        cursors: vec![
            CursorRecord {
                file: 0,
                line: 3,
                offset: offset(MAIN_C, "main"),
                end: offset(MAIN_C, "main") + 4,
                spelling: "main".into(),
                usr: Some("c:@F@main".into()),
                is_definition: true,
                kind: Some("function".into()),
                ..CursorRecord::default()
            },
            CursorRecord {
                file: 0,
                line: 3,
                offset: printf_begin,
                end: printf_end,
                spelling: "printf".into(),
                usr: Some("c:@F@printf".into()),
                referenced: Some(LocationRecord {
                    file: Some(2),
                    line: 300,
                    offset: 9000,
                    usr: Some("c:@F@printf".into()),
                }),
                ..CursorRecord::default()
            },
            CursorRecord {
                file: 0,
                line: 3,
                offset: call_begin,
                end: call_begin + 4,
                spelling: "util".into(),
                usr: Some("c:@F@util".into()),
                referenced: Some(LocationRecord {
                    file: Some(1),
                    line: 1,
                    offset: 4,
                    usr: Some("c:@F@util".into()),
                }),
                ..CursorRecord::default()
            },
            util_h_declaration(),
        ],
        includes: vec![
            include(0, MAIN_C, "#include \"util.h\"", 1),
            include(0, MAIN_C, "#include <stdio.h>", 2),
        ],
    };
    assert!(call_end > call_begin);

    let util_dump = TuDump {
        name: Some("util.c".into()),
        // Relative paths resolve against the dump's directory.
        files: vec![PathBuf::from("../src/util.c"), PathBuf::from("../src/util.h")],
        cursors: vec![
            CursorRecord {
                file: 0,
                line: 2,
                offset: offset(UTIL_C, "util("),
                end: offset(UTIL_C, "util(") + 4,
                spelling: "util".into(),
                usr: Some("c:@F@util".into()),
                is_definition: true,
                kind: Some("function".into()),
                ..CursorRecord::default()
            },
            util_h_declaration(),
        ],
        includes: vec![include(0, UTIL_C, "#include \"util.h\"", 1)],
        ..TuDump::default()
    };

    let broken = dumps.join("broken.json");
    fs::write(&broken, "{ not json").unwrap();

    let units = vec![
        write_dump(&dumps, "main.json", &main_dump),
        write_dump(&dumps, "util.json", &util_dump),
        broken,
    ];
    Fixture {
        _tmp: tmp,
        src,
        out,
        units,
    }
}

fn new_index(fx: &Fixture) -> DumpIndex {
    XrefIndex::new(
        PathMap::new([(fx.src.clone(), fx.out.clone())]),
        Box::new(|markup: &mut Markup, cursor: &CursorRecord| {
            if cursor.usr.as_deref() == Some("c:@F@printf") {
                markup.link = Link::External("https://man.example/printf".into());
            }
        }),
    )
}

#[test]
fn overlapping_units_render_one_consistent_site() {
    let fx = fixture();
    let mut index = new_index(&fx);

    let stats = index_units(&index, &fx.units, Some(4)).unwrap();
    assert_eq!(
        stats,
        IndexStats {
            units_ok: 2,
            units_failed: 1,
            files_claimed: 3,
            definitions: 2,
        }
    );
    // stdio.h is outside the source root and never gets an entry.
    assert_eq!(index.files().len(), 3);
    assert!(index.find_missing_def("c:@F@util").is_some());
    assert!(index.find_missing_def("c:@F@printf").is_none());

    let output = index
        .write_output(&SimpleTemplate::parse("{{filename}}\n{{code}}"))
        .unwrap();
    assert_eq!(output.files_written, 3);
    assert_eq!(output.files_skipped, 0);

    let main = fs::read_to_string(fx.out.join("main.c.html")).unwrap();
    assert!(main.starts_with("main.c\n"));
    assert!(main.contains("<a href=\"util.h.html\" class=\"pp\">#include \"util.h\"</a>"));
    assert!(main.contains("#include &lt;stdio.h&gt;"));
    assert!(main.contains("<span class=\"kw\">int</span> <span class=\"fn\" id=\"main_"));
    assert!(main.contains("<a href=\"https://man.example/printf\">printf</a>"));
    assert!(main.contains("<a href=\"util.h.html#util_4\">util</a>(1)"));

    let header = fs::read_to_string(fx.out.join("util.h.html")).unwrap();
    let util_def = format!("util_{}", offset(UTIL_C, "util("));
    assert!(header.contains(&format!(
        "<a href=\"util.c.html#{}\" class=\"fn\" id=\"util_4\">util</a>",
        util_def
    )));
    assert_eq!(header.matches("id=\"util_4\"").count(), 1);

    let source = fs::read_to_string(fx.out.join("util.c.html")).unwrap();
    assert!(source.contains(&format!("<span class=\"fn\" id=\"{}\">util</span>", util_def)));
}

#[test]
fn repeated_runs_produce_identical_output() {
    let render = || {
        let fx = fixture();
        let mut index = new_index(&fx);
        index_units(&index, &fx.units, Some(3)).unwrap();
        index.write_output(&SimpleTemplate::builtin()).unwrap();
        ["main.c.html", "util.c.html", "util.h.html"]
            .map(|f| fs::read_to_string(fx.out.join(f)).unwrap())
    };
    assert_eq!(render(), render());
}
