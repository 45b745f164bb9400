use mailman::context::{ContextRequest, build_context, pair_row};
use mailman::loader::load_document;
use mailman::render::{RenderEngine, RenderOptions, preprocess};
use mailman::spreadsheet::{Sheet, Spreadsheet, Workspace};
use mailman::{CellValue, Context, MailmanError, MergeTemplate, ResolveError};
use serde_json::Value;
use std::io::Write;

// Helper function to build the roster used by most tests
fn roster() -> Spreadsheet {
    let mut doc = Spreadsheet::new("Roster", "https://sheets.example.com/d/roster");
    let mut people = Sheet::from_rows(
        "People",
        vec![
            vec!["Name".into(), "Email".into(), "Company".into(), "Send".into()],
            vec!["Ada".into(), "ada@example.com".into(), "Q&A Ltd".into(), "yes".into()],
            vec!["Grace".into(), "grace@example.com".into()],
            vec!["Linus".into(), "linus@example.com".into(), "".into(), "yes".into()],
        ],
    );
    people.set_active_cell(2, 1);
    doc.add_sheet(people);
    doc.add_sheet(Sheet::from_rows(
        "Totals",
        vec![vec!["Total".into()], vec![42.0.into()]],
    ));
    doc
}

// Helper function to check a context field
fn assert_field(context: &Context, key: &str, expected: Option<Value>) {
    assert_eq!(context.get(key).cloned(), expected, "field {}", key);
    println!("✓ {} is {:?}", key, expected);
}

#[test]
fn test_hello_world() {
    let engine = RenderEngine::new();
    let mut context = Context::new();
    context.insert("Name", "World");
    let options = RenderOptions {
        context: Some(context),
        ..Default::default()
    };
    let rendered = engine
        .render("Hello <<Name>>", &options, &Workspace::new())
        .unwrap();
    assert_eq!(rendered, "Hello World");
}

#[test]
fn test_explicit_context_wins() {
    let engine = RenderEngine::new();
    let mut context = Context::new();
    context.insert("Name", "Override");
    let options = RenderOptions {
        context: Some(context),
        sheet_name: Some("Missing".to_string()),
        ..Default::default()
    };
    // sheet hints are ignored, so the unknown sheet is never looked up
    assert_eq!(
        engine.render("<<Name>>", &options, &roster()).unwrap(),
        "Override"
    );
}

#[test]
fn test_render_from_active_row() {
    let engine = RenderEngine::new();
    let doc = roster();
    let rendered = engine
        .render(
            "&lt;&lt;Name&gt;&gt; works at {{ Company }}",
            &RenderOptions::default(),
            &doc,
        )
        .unwrap();
    assert_eq!(rendered, "Ada works at Q&amp;A Ltd");
}

#[test]
fn test_render_named_sheet_and_rows() {
    let engine = RenderEngine::new();
    let doc = roster();
    let options: RenderOptions =
        serde_json::from_str(r#"{"sheetName": "Totals", "headerRowIndex": 1, "dataRowIndex": 2}"#)
            .unwrap();
    assert_eq!(
        engine.render("Total: <<Total>>", &options, &doc).unwrap(),
        "Total: 42"
    );
    assert_eq!(
        engine.render("{{sheet_url}}", &options, &doc).unwrap(),
        "https://sheets.example.com/d/roster"
    );
}

#[test]
fn test_context_pairs() {
    let doc = roster();
    let request = ContextRequest {
        data_row_index: Some(3),
        ..Default::default()
    };
    let context = build_context(&doc, &request).unwrap();
    assert_field(&context, "Name", Some(Value::from("Grace")));
    assert_field(&context, "Email", Some(Value::from("grace@example.com")));
    assert_field(&context, "Company", None);
    assert_eq!(context.len(), 2);

    let row = doc.sheets[0].get_sheet_values(3, 1, 1, 128).remove(0);
    let headers = doc.sheets[0].get_sheet_values(1, 1, 1, 128).remove(0);
    assert_eq!(pair_row(headers, row).len(), 2);
}

#[test]
fn test_empty_value_is_dropped() {
    let doc = roster();
    let request = ContextRequest {
        data_row_index: Some(4),
        ..Default::default()
    };
    let context = build_context(&doc, &request).unwrap();
    assert_field(&context, "Company", None);
    assert_field(&context, "Send", Some(Value::from("yes")));
}

#[test]
fn test_unknown_sheet_fails() {
    let engine = RenderEngine::new();
    let options = RenderOptions {
        sheet_name: Some("Nope".to_string()),
        ..Default::default()
    };
    let err = engine.render("<<Name>>", &options, &roster()).unwrap_err();
    assert!(matches!(
        err,
        MailmanError::Resolve(ResolveError::SheetNotFound(ref name)) if name == "Nope"
    ));
}

#[test]
fn test_unknown_document_fails() {
    let mut workspace = Workspace::new();
    workspace.open(roster());
    let request = ContextRequest {
        spreadsheet_name: Some("Budget"),
        ..Default::default()
    };
    assert_eq!(
        build_context(&workspace, &request).unwrap_err(),
        ResolveError::DocumentNotFound("Budget".to_string())
    );
    assert_eq!(
        build_context(&Workspace::new(), &ContextRequest::default()).unwrap_err(),
        ResolveError::NoActiveDocument
    );
}

#[test]
fn test_template_errors_propagate() {
    let engine = RenderEngine::new();
    let err = engine
        .render_with_context("{{#if}}unclosed", &Context::new())
        .unwrap_err();
    assert!(matches!(err, MailmanError::Template(_)));
}

#[test]
fn test_engine_reused_across_renders() {
    let engine = RenderEngine::new();
    let doc = roster();
    for row in 2..=4 {
        let options = RenderOptions {
            data_row_index: Some(row),
            ..Default::default()
        };
        let rendered = engine.render("{{upper [Name]}}", &options, &doc).unwrap();
        assert_eq!(rendered, rendered.to_uppercase());
    }
    assert!(engine.has_helper("upper"));
    assert!(engine.has_helper("sheet_url"));
}

#[test]
fn test_preprocess_examples() {
    assert_eq!(preprocess("<<Name>>"), "{{[Name]}}");
    assert_eq!(preprocess("&lt;&lt;Name&gt;&gt;"), "{{[Name]}}");
    assert_eq!(preprocess("{{ Name }}"), "{{Name}}");
    assert_eq!(preprocess("{{A&amp;B}}"), "{{A&B}}");
    assert_eq!(preprocess("{{A&nbsp;B}}"), "{{A B}}");
}

#[test]
fn test_merge_all_rows() {
    let engine = RenderEngine::new();
    let template = MergeTemplate::from_json(
        r#"{
            "title": "Launch",
            "sheetName": "People",
            "headerRowNumber": 1,
            "conditional": "<<Send>>",
            "emailTemplate": {
                "to": "<<Email>>",
                "subject": "Hi <<Name>>",
                "body": "<p>{{default [Company] \"friend\"}}</p>"
            }
        }"#,
    )
    .unwrap();

    let emails = template.render_all(&engine, &roster()).unwrap();
    // Grace has no Send value and is skipped
    assert_eq!(emails.len(), 2);
    assert_eq!(emails[0].row, 2);
    assert_eq!(emails[0].to, "ada@example.com");
    assert_eq!(emails[0].subject, "Hi Ada");
    assert_eq!(emails[0].body, "<p>Q&amp;A Ltd</p>");
    assert_eq!(emails[1].row, 4);
    assert_eq!(emails[1].body, "<p>friend</p>");
    assert_eq!(emails[1].cc, "");
}

#[test]
fn test_load_csv_document() {
    let mut file = tempfile::Builder::new()
        .prefix("contacts")
        .suffix(".csv")
        .tempfile()
        .unwrap();
    writeln!(file, "Name,\"Full Address\",Age").unwrap();
    writeln!(file, "Ada,\"12 Main St, London\",36").unwrap();

    let doc = load_document("Contacts", &[file.path()]).unwrap();
    assert!(doc.url().starts_with("file://"));
    let sheet = doc.active_sheet().unwrap();
    assert_eq!(sheet.get_value(2, 3), Some(&CellValue::Number(36.0)));

    let engine = RenderEngine::new();
    let options = RenderOptions {
        data_row_index: Some(2),
        ..Default::default()
    };
    assert_eq!(
        engine
            .render("<<Name>> (<<Age>>) lives at << Full Address >>", &options, &doc)
            .unwrap(),
        "Ada (36) lives at 12 Main St, London"
    );
}
