//! Output folder and archive behavior through the public API

use chrono::NaiveDate;
use codelist_exporter::output::{archive_and_cleanup, OutputError, OutputFolder};
use codelist_exporter::{Codelist, Environment, ExportedCodelist};
use std::fs::File;
use std::io::Read;
use tempfile::TempDir;
use zip::ZipArchive;

fn exported(id: &str, name: &str, content: &str) -> ExportedCodelist {
    ExportedCodelist::new(Codelist::new(id, name), content.to_string()).unwrap()
}

fn folder(root: &TempDir) -> OutputFolder {
    let date = NaiveDate::from_ymd_opt(2024, 11, 5).unwrap();
    OutputFolder::new(root.path(), "tSt", Environment::Uat, date)
}

#[test]
fn test_folder_and_archive_names() {
    let tmp = TempDir::new().unwrap();
    let folder = folder(&tmp);

    assert_eq!(folder.name(), "tSt-codelists-UAT-2024-11-05");
    assert_eq!(folder.path(), tmp.path().join("tSt-codelists-UAT-2024-11-05"));
    assert_eq!(
        folder.archive_path(),
        tmp.path().join("tSt-codelists-UAT-2024-11-05.zip")
    );
}

#[test]
fn test_same_name_appends() {
    let tmp = TempDir::new().unwrap();
    let folder = folder(&tmp);

    folder.write_csv(&exported("c1", "Units", "a\n")).unwrap();
    let path = folder.write_csv(&exported("c2", "Units", "b\n")).unwrap();

    assert_eq!(std::fs::read_to_string(path).unwrap(), "a\nb\n");
}

#[test]
fn test_archive_contains_every_file_and_removes_folder() {
    let tmp = TempDir::new().unwrap();
    let folder = folder(&tmp);
    folder.write_csv(&exported("c1", "Units", "m,metre\n")).unwrap();
    folder.write_csv(&exported("c2", "a/b", "x\n")).unwrap();

    let archive = folder.archive_and_cleanup().unwrap();

    assert!(!folder.path().exists());
    let mut zip = ZipArchive::new(File::open(&archive).unwrap()).unwrap();
    let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(names, vec!["Units.csv", "a_b.csv"]);

    let mut content = String::new();
    zip.by_name("Units.csv")
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert_eq!(content, "m,metre\n");
}

#[test]
fn test_archive_without_folder_fails() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("never-created");

    let err = archive_and_cleanup(&missing, &tmp.path().join("out.zip")).unwrap_err();

    assert!(matches!(err, OutputError::MissingFolder(path) if path == missing));
    assert!(!tmp.path().join("out.zip").exists());
}
