//! Selection providers through the public API

use codelist_exporter::select::{
    PresetSelector, SelectionError, SelectionOption, SelectionProvider, TerminalSelector,
};
use codelist_exporter::Environment;
use std::io::Cursor;
use std::str::FromStr;

fn environments() -> Vec<SelectionOption> {
    Environment::ALL
        .iter()
        .map(|e| SelectionOption::new(e.as_str(), e.as_str()))
        .collect()
}

#[test]
fn test_terminal_menu_picks_environment() {
    let mut selector = TerminalSelector::new(Cursor::new("3\n"), Vec::new());

    let key = selector
        .select("Select an environment", &environments())
        .unwrap();

    assert_eq!(Environment::from_str(&key).unwrap(), Environment::Prod);
    let shown = String::from_utf8(selector.into_output()).unwrap();
    assert!(shown.contains("Select an environment:"));
    assert!(shown.contains("1. DEV"));
    assert!(shown.contains("3. PROD"));
}

#[test]
fn test_terminal_menu_reprompts_until_valid() {
    let mut selector = TerminalSelector::new(Cursor::new("0\nabc\n2\n"), Vec::new());

    let key = selector
        .select("Select an environment", &environments())
        .unwrap();

    assert_eq!(key, "UAT");
    let shown = String::from_utf8(selector.into_output()).unwrap();
    assert_eq!(shown.matches("Enter choice [1-3]: ").count(), 3);
    assert!(shown.contains("Invalid choice 'abc'"));
}

#[test]
fn test_terminal_menu_input_closed() {
    let mut selector = TerminalSelector::new(Cursor::new(""), Vec::new());

    let err = selector
        .select("Select an environment", &environments())
        .unwrap_err();

    assert!(matches!(err, SelectionError::InputClosed(_)));
}

#[test]
fn test_preset_matches_label_or_key() {
    let domains = vec![
        SelectionOption::new("Test", "tSt"),
        SelectionOption::new("Units of measure", "UOM"),
    ];

    assert_eq!(
        PresetSelector::new("units of measure")
            .select("Select a domain", &domains)
            .unwrap(),
        "UOM"
    );
    assert_eq!(
        PresetSelector::new("TST")
            .select("Select a domain", &domains)
            .unwrap(),
        "tSt"
    );
    assert!(matches!(
        PresetSelector::new("nope").select("Select a domain", &domains),
        Err(SelectionError::NoMatch { .. })
    ));
}
