use hsn_validator::app::serve;
use hsn_validator::{validate, GuardrailChain, TableSource, TableStore, ValidationService};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn write_master(dir: &TempDir, rows: &[(&str, &str)]) -> std::path::PathBuf {
    let path = dir.path().join("HSN_SAC.csv");
    let mut content = String::from("HSNCode,Description\n");
    for (code, description) in rows {
        content.push_str(&format!("{},{}\n", code, description));
    }
    // write-then-rename so a concurrent reader never sees a partial file
    let tmp = dir.path().join("HSN_SAC.csv.tmp");
    std::fs::write(&tmp, content).unwrap();
    std::fs::rename(&tmp, &path).unwrap();
    path
}

#[test]
fn test_concurrent_readers_see_whole_snapshots() {
    let dir = TempDir::new().unwrap();
    let path = write_master(&dir, &[("0101", "Live horses"), ("0102", "Live bovine animals")]);
    let source = TableSource::new(&path);
    let store = Arc::new(TableStore::from_source(&source));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..200 {
                    let table = store.snapshot();
                    let results = validate(&["0101", "0102"], &table);
                    // both codes come from the same version of the file
                    assert_eq!(results[0].is_valid, results[1].is_valid);
                    assert_eq!(results.len(), 2);
                }
            })
        })
        .collect();

    for round in 0..20 {
        let rows: &[(&str, &str)] = if round % 2 == 0 {
            &[("0103", "Live swine"), ("0104", "Live sheep")]
        } else {
            &[("0101", "Live horses"), ("0102", "Live bovine animals")]
        };
        write_master(&dir, rows);
        store.reload(&source);
    }

    for reader in readers {
        reader.join().unwrap();
    }
}

#[tokio::test]
async fn test_background_reload_picks_up_new_file() {
    let dir = TempDir::new().unwrap();
    let source = TableSource::new(dir.path().join("HSN_SAC.csv"));

    let service = Arc::new(ValidationService::new(
        TableStore::from_source(&source),
        GuardrailChain::new(),
    ));
    assert_eq!(service.table_len(), 0);

    let handle = serve::spawn_reload_task(
        Arc::clone(&service),
        source.clone(),
        Duration::from_millis(50),
    );

    write_master(&dir, &[("0101", "Live horses")]);

    let mut loaded = false;
    for _ in 0..40 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if service.table_len() == 1 {
            loaded = true;
            break;
        }
    }
    handle.abort();

    assert!(loaded, "reload task never published the new table");
    assert!(service.validate_codes(&["0101"])[0].is_valid);
}

#[test]
fn test_serve_loop_over_reloaded_table() {
    let dir = TempDir::new().unwrap();
    let path = write_master(&dir, &[("0101", "Live horses")]);
    let source = TableSource::new(&path);
    let service = ValidationService::new(TableStore::from_source(&source), GuardrailChain::new());

    let mut output = Vec::new();
    let served = tokio_test::block_on(serve::run(&service, &b"0101\n0102\n"[..], &mut output)).unwrap();
    assert_eq!(served, 2);

    write_master(&dir, &[("0101", "Live horses"), ("0102", "Live bovine animals")]);
    assert_eq!(service.reload(&source), 2);

    let mut output_after = Vec::new();
    tokio_test::block_on(serve::run(&service, &b"0102\n"[..], &mut output_after)).unwrap();

    let before = String::from_utf8(output).unwrap();
    let after = String::from_utf8(output_after).unwrap();
    assert!(before.lines().nth(1).unwrap().contains("NOT_FOUND"));
    assert!(after.contains("Live bovine animals"));
}
