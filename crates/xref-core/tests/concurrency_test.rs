//! Races between indexing workers on the shared file table and registry.

use std::borrow::Cow;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use rayon::prelude::*;
use xref_core::{FileHandle, FileId, PathMap, XrefIndex, WHOLE_FILE};

const THREADS: usize = 8;

struct TestFile(PathBuf);

impl FileHandle for TestFile {
    fn unique_id(&self) -> Option<FileId> {
        Some(FileId::for_path(&self.0))
    }

    fn path(&self) -> Cow<'_, Path> {
        Cow::Borrowed(&self.0)
    }
}

fn index() -> XrefIndex<()> {
    XrefIndex::without_external_links(PathMap::new([("/src", "/out")]))
}

#[test]
fn racing_claims_have_exactly_one_winner_per_file() {
    let index = index();
    let files: Vec<TestFile> = (0..4)
        .map(|i| TestFile(PathBuf::from(format!("/src/f{}.c", i))))
        .collect();
    let barrier = Barrier::new(THREADS);
    let wins = AtomicUsize::new(0);
    let entries = Mutex::new(Vec::new());

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                barrier.wait();
                for f in &files {
                    let entry = index.obtain_file_entry(f).unwrap();
                    entries.lock().unwrap().push((f.0.clone(), entry));
                    if index.prepare_to_process(f).is_some() {
                        wins.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
    });

    assert_eq!(wins.load(Ordering::Relaxed), files.len());
    assert_eq!(index.files().len(), files.len());

    // Every thread saw the same entry for a given file, distinct across files.
    let entries = entries.into_inner().unwrap();
    for f in &files {
        let canonical = index.obtain_file_entry(f).unwrap();
        for (_, e) in entries.iter().filter(|(p, _)| *p == f.0) {
            assert!(Arc::ptr_eq(e, &canonical));
        }
    }
    let distinct: HashSet<*const _> = entries.iter().map(|(_, e)| Arc::as_ptr(e)).collect();
    assert_eq!(distinct.len(), files.len());
}

#[test]
fn racing_references_create_one_declaration_and_name_it_once() {
    let index = index();
    let file = TestFile("/src/a.c".into());
    let barrier = Barrier::new(THREADS);
    let namer_calls = AtomicUsize::new(0);
    let results = Mutex::new(Vec::new());

    thread::scope(|s| {
        for t in 0..THREADS {
            let (index, file, barrier, namer_calls, results) =
                (&index, &file, &barrier, &namer_calls, &results);
            s.spawn(move || {
                barrier.wait();
                let decl = index
                    .reference_symbol(file, t as u32 + 1, 100, || {
                        namer_calls.fetch_add(1, Ordering::SeqCst);
                        format!("foo_{}", t + 1)
                    })
                    .unwrap();
                results.lock().unwrap().push(decl);
            });
        }
    });

    assert_eq!(namer_calls.load(Ordering::SeqCst), 1);
    assert_eq!(index.symbols().len(), 1);

    let results = results.into_inner().unwrap();
    assert_eq!(results.len(), THREADS);
    let first = &results[0];
    assert!(results.iter().all(|d| Arc::ptr_eq(d, first)));

    // Line and name come from the same (winning) call.
    let name = first.file_unique_name();
    assert_eq!(name, format!("foo_{}", first.line()));
}

#[test]
fn two_threads_one_permanent_name() {
    let index = index();
    let file = TestFile("/src/f.c".into());
    let barrier = Barrier::new(2);

    let (a, b) = thread::scope(|s| {
        let ha = s.spawn(|| {
            barrier.wait();
            index.reference_symbol(&file, 1, 100, || "foo_1".into()).unwrap()
        });
        let hb = s.spawn(|| {
            barrier.wait();
            index.reference_symbol(&file, 1, 100, || "foo_2".into()).unwrap()
        });
        (ha.join().unwrap(), hb.join().unwrap())
    });

    assert!(Arc::ptr_eq(&a, &b));
    assert!(["foo_1", "foo_2"].contains(&a.file_unique_name()));
}

#[test]
fn parallel_stress_over_many_keys() {
    let index = index();
    let files: Vec<TestFile> = (0..16)
        .map(|i| TestFile(PathBuf::from(format!("/src/dir{}/f{}.c", i % 4, i))))
        .collect();
    let namer_calls = AtomicUsize::new(0);

    (0..4096u32).into_par_iter().for_each(|n| {
        let file = &files[(n % 16) as usize];
        let offset = if n % 97 == 0 { WHOLE_FILE } else { n % 64 };
        let decl = index
            .reference_symbol(file, n, offset, || {
                namer_calls.fetch_add(1, Ordering::Relaxed);
                format!("s_{}", offset)
            })
            .unwrap();
        index.register_def(format!("usr:{}:{}", n % 16, offset), &decl);
    });

    let symbols = index.symbols().len();
    assert_eq!(namer_calls.load(Ordering::Relaxed), symbols);
    assert_eq!(index.files().len(), 16);
    assert!(symbols <= 16 * 65);

    // File index and offset share n's low bits, so file 3 sees offsets 3, 19, 35, 51.
    let def = index.find_missing_def("usr:3:19").unwrap();
    assert_eq!(def.id().offset, 19);
    assert!(index.find_missing_def("usr:3:5").is_none());
    assert_eq!(def.file().unwrap().id(), files[3].unique_id().unwrap());
}
