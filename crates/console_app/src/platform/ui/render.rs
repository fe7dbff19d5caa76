use std::fmt::Write;

use console_core::{
    ActionOutputView, ConsoleViewModel, DetailPanelView, DocumentPickerView, FieldKind,
    FieldView, ProgressBody, ProgressRowView, ProgressTableView, Redraw, StagePanelView,
    StageTabView,
};

/// Renders the parts of `view` invalidated by `scope` as plain text.
pub fn render(view: &ConsoleViewModel, scope: Redraw) -> String {
    let mut out = String::new();
    match scope {
        Redraw::All => {
            render_progress(&mut out, &view.progress);
            render_tabs(&mut out, &view.tabs);
            render_stage_panel(&mut out, &view.stage);
        }
        Redraw::Stage => {
            render_tabs(&mut out, &view.tabs);
            render_stage_panel(&mut out, &view.stage);
        }
        Redraw::Detail => {
            render_picker(&mut out, &view.stage.picker);
            render_detail(&mut out, &view.stage.detail);
        }
    }
    out
}

fn render_progress(out: &mut String, table: &ProgressTableView) {
    let heading = if table.loading {
        "== Documents (loading...) =="
    } else {
        "== Documents =="
    };
    let _ = writeln!(out, "{heading}");
    match &table.body {
        ProgressBody::Rows(rows) => {
            for row in rows {
                render_row(out, row);
            }
        }
        ProgressBody::NoDocuments => {
            let _ = writeln!(out, "  (no documents)");
        }
        ProgressBody::LoadFailed(message) => {
            let _ = writeln!(out, "  ! {message}");
        }
    }
}

fn render_row(out: &mut String, row: &ProgressRowView) {
    let detected = row.detected_type.as_deref().unwrap_or("-");
    let _ = write!(
        out,
        "  #{:<5} {:<28} {:<10} {} [{}] {:>3}%  ",
        row.id.as_str(), row.file_name, detected, row.status, row.status_state, row.percent
    );
    let links: Vec<String> = row
        .links
        .iter()
        .map(|link| match &link.state {
            Some(state) => format!("{}:{}", link.stage, state),
            None => link.stage.to_string(),
        })
        .collect();
    let _ = writeln!(out, "{}", links.join(" "));
}

fn render_tabs(out: &mut String, tabs: &[StageTabView]) {
    let labels: Vec<String> = tabs
        .iter()
        .map(|tab| {
            if tab.active {
                format!("[{}]", tab.title)
            } else {
                tab.title.to_string()
            }
        })
        .collect();
    let _ = writeln!(out, "{}", labels.join(" | "));
}

fn render_stage_panel(out: &mut String, panel: &StagePanelView) {
    let _ = writeln!(out, "== {} ({}) ==", panel.header.title, panel.stage);
    let _ = writeln!(out, "{}", panel.header.description);
    render_picker(out, &panel.picker);
    for field in &panel.fields {
        render_field(out, field);
    }
    if panel.submitting {
        let _ = writeln!(out, "  (submitting...)");
    }
    if let Some(output) = &panel.output {
        let text = match output {
            ActionOutputView::Pending => "Working...".to_string(),
            ActionOutputView::Success(message) => format!("OK: {message}"),
            ActionOutputView::Failure(message) => format!("Error: {message}"),
        };
        let _ = writeln!(out, "  > {text}");
    }
    render_detail(out, &panel.detail);
}

fn render_picker(out: &mut String, picker: &DocumentPickerView) {
    match picker {
        DocumentPickerView::Empty { placeholder } => {
            let _ = writeln!(out, "Document: <{placeholder}>");
        }
        DocumentPickerView::Options { options, selected } => {
            let labels: Vec<String> = options
                .iter()
                .map(|option| {
                    if selected.as_ref() == Some(&option.id) {
                        format!("*{}", option.label)
                    } else {
                        option.label.clone()
                    }
                })
                .collect();
            let _ = writeln!(out, "Document: {}", labels.join(", "));
        }
    }
}

fn render_field(out: &mut String, field: &FieldView) {
    let marker = if field.required { " *" } else { "" };
    let value = match field.kind {
        FieldKind::Choice(options) => options
            .iter()
            .find(|option| option.value == field.value)
            .map(|option| option.label.to_string())
            .unwrap_or_else(|| field.value.clone()),
        FieldKind::ShortText | FieldKind::MultiLineText => field.value.replace('\n', "\n    "),
    };
    let _ = writeln!(out, "  {}{} ({}): {}", field.label, marker, field.name, value);
}

fn render_detail(out: &mut String, detail: &DetailPanelView) {
    match detail {
        DetailPanelView::NoData { placeholder } => {
            let _ = writeln!(out, "  {placeholder}");
        }
        DetailPanelView::Cards(cards) => {
            for card in cards {
                let state = card
                    .state
                    .as_deref()
                    .map(|state| format!(" [{state}]"))
                    .unwrap_or_default();
                let _ = writeln!(out, "  {}: {}{}", card.label, card.value, state);
                if let Some(description) = &card.description {
                    let _ = writeln!(out, "    {description}");
                }
            }
        }
    }
}
