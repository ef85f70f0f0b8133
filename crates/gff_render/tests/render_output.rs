use gff_core::{
    Document, FormatError, Gender, Language, LocalizedString, ResRef, Struct, Value, Version,
    decode, encode,
};
use gff_render::{
    ImportError, TextRenderOptions, document_from_json, render_json, render_text, render_value,
};
use serde_json::json;

fn journal() -> Document {
    let mut name = LocalizedString::from_string_ref(1234);
    name.set(Language::English, Gender::Male, "The Lost Ring");
    name.set(Language::French, Gender::Female, "L'anneau perdu");

    let category = Struct::new(0)
        .with("Name", name)
        .with("Tag", "q_ring")
        .with("Priority", 2u32)
        .with("EntryList", vec![Struct::new(0).with("ID", 10u32)]);

    let mut doc = Document::new(*b"JRL ");
    doc.root_mut()
        .push_to_list("Categories", category)
        .expect("Categories is created as a list");
    doc
}

#[test]
fn json_uses_canonical_key_order() {
    let value = render_json(&journal());
    let keys: Vec<&str> = value
        .as_object()
        .expect("json should be an object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["file_type", "version", "root"]);

    let field = &value["root"]["fields"][0];
    let keys: Vec<&str> = field
        .as_object()
        .expect("field should be an object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["label", "type", "value"]);
}

#[test]
fn json_shapes_match_field_types() {
    let value = render_json(&journal());
    assert_eq!(value["file_type"], "JRL");
    assert_eq!(value["version"], "V3.2");
    assert_eq!(value["root"]["struct_id"], -1);

    let categories = &value["root"]["fields"][0];
    assert_eq!(categories["label"], "Categories");
    assert_eq!(categories["type"], "list");

    let category = &categories["value"][0];
    assert_eq!(category["struct_id"], 0);
    assert_eq!(
        category["fields"][0],
        json!({
            "label": "Name",
            "type": "localized_string",
            "value": {
                "string_ref": 1234,
                "substrings": [
                    {"language": "English", "gender": "Male", "text": "The Lost Ring"},
                    {"language": "French", "gender": "Female", "text": "L'anneau perdu"},
                ],
            },
        })
    );
    assert_eq!(category["fields"][2]["value"], 2);
}

#[test]
fn binary_and_vectors_render_compactly() {
    let mut doc = Document::new(*b"UTP ");
    doc.root_mut().set("Blob", vec![0x00u8, 0xab, 0x10]);
    doc.root_mut().set("Position", [1.0f32, 2.5, -3.0]);
    doc.root_mut().set("Name", LocalizedString::default());

    let value = render_json(&doc);
    assert_eq!(value["root"]["fields"][0]["value"], "00ab10");
    assert_eq!(value["root"]["fields"][1]["value"], json!([1.0, 2.5, -3.0]));
    assert_eq!(
        value["root"]["fields"][2]["value"],
        json!({"string_ref": null, "substrings": []})
    );
}

#[test]
fn json_import_inverts_render() {
    let mut doc = journal();
    doc.set_version(Version::V3_3);
    doc.root_mut().set("Icon", ResRef::new("ir_ring"));
    doc.root_mut().set("Huge", u64::MAX);
    doc.root_mut().set("Weight", -0.5f64);
    doc.root_mut().set("Facing", [0.0f32, 0.0, 1.0, 0.0]);

    let imported = document_from_json(&render_json(&doc)).expect("import");
    assert_eq!(imported, doc);

    let bytes = encode(&imported).expect("encode");
    assert_eq!(decode(&bytes, *b"JRL ").expect("decode"), doc);
}

#[test]
fn json_import_reports_the_failing_path() {
    let json = json!({
        "file_type": "GIT",
        "version": "V3.2",
        "root": {
            "struct_id": -1,
            "fields": [
                {"label": "Count", "type": "uint8", "value": 300},
            ],
        },
    });
    let err = document_from_json(&json).unwrap_err();
    assert_eq!(err.to_string(), "$.root.fields[0].value: 300 is out of range");

    let json = json!({
        "file_type": "GIT",
        "version": "V3.2",
        "root": {"struct_id": -1, "fields": [{"label": "X", "type": "quaternion", "value": 1}]},
    });
    assert!(matches!(
        document_from_json(&json),
        Err(ImportError::UnknownType { name, .. }) if name == "quaternion"
    ));
}

#[test]
fn json_import_enforces_label_limit() {
    let json = json!({
        "file_type": "GFF",
        "version": "V3.2",
        "root": {
            "struct_id": -1,
            "fields": [
                {"label": "AVeryLongLabelName", "type": "int32", "value": 1},
            ],
        },
    });
    assert!(matches!(
        document_from_json(&json),
        Err(ImportError::Format(FormatError::LabelTooLong { len: 18, .. }))
    ));
}

#[test]
fn text_tree_indents_nested_structs() {
    let text = render_text(&journal(), TextRenderOptions::default());
    let expected = "\
JRL V3.2
Categories: list (1)
  [0]
    Name: localized_string = strref 1234, English/Male \"The Lost Ring\", French/Female \"L'anneau perdu\"
    Tag: string = \"q_ring\"
    Priority: uint32 = 2
    EntryList: list (1)
      [0]
        ID: uint32 = 10
";
    assert_eq!(text, expected);
}

#[test]
fn text_tree_can_show_struct_ids() {
    let mut doc = Document::new(*b"GAM ");
    doc.root_mut()
        .set("Party", Struct::new(42).with("Gold", 500i32));
    let text = render_text(
        &doc,
        TextRenderOptions {
            show_struct_ids: true,
        },
    );
    assert_eq!(
        text,
        "GAM V3.2\nroot #-1\nParty: struct #42\n  Gold: int32 = 500\n"
    );
}

#[test]
fn single_values_render_on_one_line() {
    assert_eq!(render_value(&Value::I32(-7)), "-7");
    assert_eq!(render_value(&Value::Vector3([1.0, 0.5, -2.0])), "1,0.5,-2");
    assert_eq!(render_value(&Value::Binary(vec![0xde, 0xad])), "dead");
    assert_eq!(render_value(&Value::ResRef(ResRef::new("nw_door"))), "nw_door");
    assert_eq!(
        render_value(&Value::LocString(LocalizedString::default())),
        "strref none"
    );
    assert_eq!(
        render_value(&Value::List(vec![Struct::new(1), Struct::new(2)])),
        "list (2 entries)"
    );
}

#[test]
fn json_import_checks_locstring_ids() {
    let document = |value: serde_json::Value| {
        json!({
            "file_type": "JRL",
            "version": "V3.2",
            "root": {
                "struct_id": -1,
                "fields": [{"label": "Name", "type": "localized_string", "value": value}],
            },
        })
    };

    let imported = document_from_json(&document(json!({
        "string_ref": null,
        "substrings": [{"language": 20, "gender": 1, "text": "x"}],
    })))
    .expect("numeric ids import");
    let name = imported.root().get_locstring("Name").expect("locstring");
    assert_eq!(name.get(Language::Unknown(20), Gender::Female), Some("x"));

    let err = document_from_json(&document(json!({
        "string_ref": null,
        "substrings": [{"language": 0, "gender": 2, "text": "x"}],
    })))
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "$.root.fields[0].value.substrings[0].gender: 2 is not 0 or 1"
    );

    let err = document_from_json(&document(json!({
        "string_ref": 4294967295u32,
        "substrings": [],
    })))
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "$.root.fields[0].value.string_ref: 0xFFFFFFFF is reserved, use null"
    );
}

#[test]
fn json_import_rejects_labels_with_nul_bytes() {
    let json = json!({
        "file_type": "GFF",
        "version": "V3.2",
        "root": {
            "struct_id": -1,
            "fields": [{"label": "A\u{0}B", "type": "uint8", "value": 1}],
        },
    });
    assert!(matches!(
        document_from_json(&json),
        Err(ImportError::Format(FormatError::LabelContainsNul { .. }))
    ));
}
