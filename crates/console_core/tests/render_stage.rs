use std::collections::BTreeMap;

use console_core::{
    render_detail, render_stage, DetailCardView, DetailPanelView, DocumentEntry, DocumentId,
    DocumentPickerView, FieldKind, FormFields, LoadTicket, MetricCard, ProgressStore, StageDetail,
    StageKey, LAST_UPDATED_LABEL, NO_DATA_PLACEHOLDER, NO_DOCUMENTS_PLACEHOLDER,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn detail(label: &str, value: serde_json::Value) -> StageDetail {
    StageDetail {
        metrics: vec![MetricCard {
            label: label.to_string(),
            value,
            state: Some("completed".to_string()),
            description: None,
        }],
        updated_at: None,
        state: Some("completed".to_string()),
        label: None,
    }
}

fn entry(id: &str, stages: &[(StageKey, StageDetail)]) -> DocumentEntry {
    DocumentEntry {
        id: DocumentId::new(id),
        file_name: format!("doc-{id}.pdf"),
        detected_type: Some("LISTA".to_string()),
        status: "PROCESSED".to_string(),
        status_state: "in_progress".to_string(),
        completion: 0.5,
        stages: stages.iter().cloned().collect::<BTreeMap<_, _>>(),
    }
}

fn store_with(entries: Vec<DocumentEntry>) -> ProgressStore {
    let mut store = ProgressStore::new();
    let ticket: LoadTicket = store.begin_load();
    store.complete_load(ticket, Ok(entries));
    store
}

#[test]
fn extra_fields_match_each_stage() {
    let store = ProgressStore::new();
    let form = FormFields::new();
    for stage in StageKey::ALL {
        let view = render_stage(stage, &store, None, &form);
        let names: Vec<_> = view.fields.iter().map(|field| field.name).collect();
        let expected: Vec<&str> = match stage {
            StageKey::Approve => vec!["approver_id", "summary"],
            StageKey::Review => vec!["status"],
            StageKey::Export => vec!["output_dir"],
            _ => vec![],
        };
        assert_eq!(names, expected, "fields for {stage}");
        // Rendering twice yields the same view.
        assert_eq!(view, render_stage(stage, &store, None, &form));
    }
}

#[test]
fn approve_and_review_field_shapes() {
    let store = ProgressStore::new();
    let form = FormFields::new();

    let approve = render_stage(StageKey::Approve, &store, None, &form);
    assert!(approve.fields[0].required);
    assert_eq!(approve.fields[0].kind, FieldKind::ShortText);
    assert!(!approve.fields[1].required);
    assert_eq!(approve.fields[1].kind, FieldKind::MultiLineText);

    let review = render_stage(StageKey::Review, &store, None, &form);
    let FieldKind::Choice(options) = review.fields[0].kind else {
        panic!("review status should be a choice");
    };
    let values: Vec<_> = options.iter().map(|option| option.value).collect();
    assert_eq!(values, vec!["", "dispute", "agreement"]);
    assert!(!review.fields[0].required);
}

#[test]
fn empty_snapshot_shows_placeholders_everywhere() {
    let store = ProgressStore::new();
    for stage in StageKey::ALL {
        for selected in [None, Some("1"), Some("missing")] {
            let view = render_stage(stage, &store, selected, &FormFields::new());
            assert_eq!(
                view.picker,
                DocumentPickerView::Empty {
                    placeholder: NO_DOCUMENTS_PLACEHOLDER
                }
            );
            assert_eq!(
                view.detail,
                DetailPanelView::NoData {
                    placeholder: NO_DATA_PLACEHOLDER
                }
            );
        }
    }
}

#[test]
fn picker_keeps_backend_order_and_defaults_to_first() {
    let store = store_with(vec![entry("9", &[]), entry("3", &[]), entry("5", &[])]);
    let view = render_stage(StageKey::Ocr, &store, None, &FormFields::new());
    let DocumentPickerView::Options { options, selected } = view.picker else {
        panic!("expected options");
    };
    let ids: Vec<_> = options.iter().map(|option| option.id.as_str()).collect();
    assert_eq!(ids, vec!["9", "3", "5"]);
    assert_eq!(selected.as_ref().map(DocumentId::as_str), Some("9"));
    assert_eq!(options[1].label, "#3 doc-3.pdf");
}

#[test]
fn header_comes_from_registry() {
    let store = ProgressStore::new();
    let view = render_stage(StageKey::Match, &store, None, &FormFields::new());
    assert_eq!(view.header.title, StageKey::Match.config().title);
    assert_eq!(view.header.description, StageKey::Match.config().description);
}

#[test]
fn detail_cards_follow_metrics_and_timestamp() {
    let mut ocr = detail("Detected type", json!("LISTA"));
    ocr.metrics.push(MetricCard {
        label: "Rows".to_string(),
        value: json!(12),
        state: None,
        description: Some("Total extracted rows.".to_string()),
    });
    ocr.updated_at = Some("2024-05-02T08:30:00".to_string());
    let store = store_with(vec![entry("1", &[(StageKey::Ocr, ocr)])]);

    let view = render_stage(StageKey::Ocr, &store, Some("1"), &FormFields::new());
    assert_eq!(
        view.detail,
        DetailPanelView::Cards(vec![
            DetailCardView {
                label: "Detected type".to_string(),
                value: "LISTA".to_string(),
                state: Some("completed".to_string()),
                description: None,
            },
            DetailCardView {
                label: "Rows".to_string(),
                value: "12".to_string(),
                state: None,
                description: Some("Total extracted rows.".to_string()),
            },
            DetailCardView {
                label: LAST_UPDATED_LABEL.to_string(),
                value: "02/05/2024 08:30:00".to_string(),
                state: None,
                description: None,
            },
        ])
    );

    let missing = render_stage(StageKey::Export, &store, Some("1"), &FormFields::new());
    assert_eq!(missing.detail, render_detail(None));
}

#[test]
fn field_values_come_from_the_form() {
    let store = ProgressStore::new();
    let mut form = FormFields::new();
    form.insert("output_dir".to_string(), "/srv/exports".to_string());
    let view = render_stage(StageKey::Export, &store, None, &form);
    assert_eq!(view.fields[0].value, "/srv/exports");
}
