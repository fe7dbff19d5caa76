//! Pure rendering: snapshot plus navigation in, immutable view description out.
//!
//! Nothing here keeps state between calls, so a stage switch simply renders a
//! fresh [`StagePanelView`] and the host replaces the old subtree with it.

use chrono::{DateTime, Local, NaiveDateTime};

use crate::view_model::{
    DetailCardView, DetailPanelView, DocumentPickerView, FieldView, PickerOptionView,
    ProgressBody, ProgressRowView, ProgressTableView, StageHeaderView, StageLinkView,
    StagePanelView, StageTabView, LAST_UPDATED_LABEL, NO_DATA_PLACEHOLDER,
    NO_DOCUMENTS_PLACEHOLDER,
};
use crate::{stages, DocumentEntry, DocumentId, FormFields, ProgressStore, StageDetail, StageKey};

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// The entry the stage panel works on. An explicit pick resolves only to
/// that entry; without one the first entry is used.
pub fn resolve_selection<'a>(
    entries: &'a [DocumentEntry],
    selected: Option<&str>,
) -> Option<&'a DocumentEntry> {
    match selected {
        Some(id) => entries.iter().find(|entry| entry.id.as_str() == id),
        None => entries.first(),
    }
}

pub fn render_stage(
    stage: StageKey,
    store: &ProgressStore,
    selected: Option<&str>,
    form: &FormFields,
) -> StagePanelView {
    let config = stage.config();
    let current = resolve_selection(store.entries(), selected);
    StagePanelView {
        stage,
        header: StageHeaderView {
            title: config.title,
            description: config.description,
        },
        picker: render_picker(store.entries(), current.map(|entry| &entry.id)),
        fields: render_fields(stage, form),
        detail: render_detail(current.and_then(|entry| entry.stage(stage))),
        output: None,
        submitting: false,
    }
}

pub fn render_picker(
    entries: &[DocumentEntry],
    selected: Option<&DocumentId>,
) -> DocumentPickerView {
    if entries.is_empty() {
        return DocumentPickerView::Empty {
            placeholder: NO_DOCUMENTS_PLACEHOLDER,
        };
    }
    DocumentPickerView::Options {
        options: entries
            .iter()
            .map(|entry| PickerOptionView {
                id: entry.id.clone(),
                label: format!("#{} {}", entry.id, entry.file_name),
            })
            .collect(),
        selected: selected.cloned(),
    }
}

pub fn render_fields(stage: StageKey, form: &FormFields) -> Vec<FieldView> {
    stage
        .extra_fields()
        .iter()
        .map(|spec| FieldView {
            name: spec.name,
            label: spec.label,
            kind: spec.kind,
            required: spec.required,
            value: form.get(spec.name).cloned().unwrap_or_default(),
        })
        .collect()
}

pub fn render_detail(detail: Option<&StageDetail>) -> DetailPanelView {
    let Some(detail) = detail else {
        return DetailPanelView::NoData {
            placeholder: NO_DATA_PLACEHOLDER,
        };
    };

    let mut cards: Vec<DetailCardView> = detail
        .metrics
        .iter()
        .map(|metric| DetailCardView {
            label: metric.label.clone(),
            value: metric.display_value(),
            state: metric.state.clone(),
            description: metric.description.clone(),
        })
        .collect();

    if let Some(updated_at) = detail.updated_at.as_deref() {
        cards.push(DetailCardView {
            label: LAST_UPDATED_LABEL.to_string(),
            value: format_timestamp(updated_at),
            state: None,
            description: None,
        });
    }
    DetailPanelView::Cards(cards)
}

pub fn render_progress(store: &ProgressStore) -> ProgressTableView {
    let body = if let Some(message) = store.last_error() {
        ProgressBody::LoadFailed(message.to_string())
    } else if store.entries().is_empty() {
        ProgressBody::NoDocuments
    } else {
        ProgressBody::Rows(store.entries().iter().map(render_row).collect())
    };
    ProgressTableView {
        body,
        loading: store.is_loading(),
    }
}

fn render_row(entry: &DocumentEntry) -> ProgressRowView {
    ProgressRowView {
        id: entry.id.clone(),
        file_name: entry.file_name.clone(),
        detected_type: entry.detected_type.clone(),
        status: entry.status.clone(),
        status_state: entry.status_state.clone(),
        percent: entry.completion_percent(),
        links: stages()
            .iter()
            .map(|config| StageLinkView {
                stage: config.key,
                title: config.title,
                state: entry
                    .stage(config.key)
                    .and_then(|detail| detail.state.clone()),
            })
            .collect(),
    }
}

pub fn render_tabs(active: StageKey) -> Vec<StageTabView> {
    stages()
        .iter()
        .map(|config| StageTabView {
            key: config.key,
            title: config.title,
            active: config.key == active,
        })
        .collect()
}

/// Formats a backend timestamp in the operator's local time. Offset-less
/// timestamps are shown as-is; anything unparseable is passed through.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed
            .with_timezone(&Local)
            .format(TIMESTAMP_FORMAT)
            .to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, pattern) {
            return parsed.format(TIMESTAMP_FORMAT).to_string();
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naive_timestamps_keep_wall_clock() {
        assert_eq!(format_timestamp("2024-03-01T10:05:09"), "01/03/2024 10:05:09");
        assert_eq!(
            format_timestamp("2024-03-01 10:05:09.123456"),
            "01/03/2024 10:05:09"
        );
    }

    #[test]
    fn offset_timestamps_are_converted_to_local_time() {
        let formatted = format_timestamp("2024-03-01T10:05:09+00:00");
        let expected = DateTime::parse_from_rfc3339("2024-03-01T10:05:09+00:00")
            .unwrap()
            .with_timezone(&Local)
            .format(TIMESTAMP_FORMAT)
            .to_string();
        assert_eq!(formatted, expected);
    }

    #[test]
    fn unparseable_timestamps_pass_through() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn missing_detail_renders_placeholder() {
        assert_eq!(
            render_detail(None),
            DetailPanelView::NoData {
                placeholder: NO_DATA_PLACEHOLDER
            }
        );
    }

    #[test]
    fn tabs_follow_registry_order() {
        let tabs = render_tabs(StageKey::Match);
        assert_eq!(tabs.len(), 8);
        assert_eq!(tabs[0].key, StageKey::Ingest);
        let active: Vec<_> = tabs.iter().filter(|tab| tab.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].key, StageKey::Match);
    }
}
