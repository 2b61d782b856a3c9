//! Static HTML rendering of walk traces.
//!
//! `render` produces one self-contained page per scenario. `write_interactive`
//! instead writes the result JSON next to a reusable viewer page that loads
//! any result file via a file picker, so one template serves every scenario.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::report::{hex64, save_json};
use crate::scenario::Scenario;
use crate::walker::{WalkResult, WalkStatus};

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render a complete standalone HTML page for one walk.
pub fn render(scenario: &Scenario, result: &WalkResult) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        "<h1>{}</h1>\n<p class=\"desc\">{}</p>\n",
        escape(&scenario.name),
        escape(&scenario.description)
    ));

    let status_class = match result.status {
        WalkStatus::Success => "ok",
        _ => "fail",
    };
    body.push_str(&format!(
        "<p>Status: <span class=\"badge {}\">{}</span></p>\n",
        status_class,
        result.status.name()
    ));

    body.push_str("<table class=\"kv\">\n");
    body.push_str(&format!(
        "<tr><th>VA</th><td>{}</td></tr>\n",
        result.input_va.to_hex()
    ));
    body.push_str(&format!(
        "<tr><th>Access</th><td>{} @ {}</td></tr>\n",
        scenario.access_type.name(),
        scenario.privilege_level()
    ));
    if let Some(ipa) = result.ipa {
        body.push_str(&format!("<tr><th>IPA</th><td>{}</td></tr>\n", hex64(ipa)));
    }
    if let Some(pa) = result.output_pa {
        body.push_str(&format!("<tr><th>PA</th><td>{}</td></tr>\n", hex64(pa)));
    }
    body.push_str(&format!(
        "<tr><th>Memory accesses</th><td>{}</td></tr>\n",
        result.total_memory_accesses
    ));
    body.push_str("</table>\n");

    if let Some(fault) = &result.fault {
        body.push_str(&format!(
            "<div class=\"fault\"><strong>{}</strong> at Stage {} Level {}<br>{}</div>\n",
            fault.kind.name(),
            fault.stage,
            fault.level,
            escape(&fault.message)
        ));
    }

    body.push_str("<h2>Walk trace</h2>\n<table class=\"trace\">\n");
    body.push_str(
        "<tr><th>#</th><th>Stage</th><th>Level</th><th>Result</th>\
         <th>Descriptor PA</th><th>Descriptor</th><th>Output</th><th>Purpose</th></tr>\n",
    );
    for event in &result.events {
        let row_class = match event.result.name() {
            "INVALID" => " class=\"invalid\"",
            _ => "",
        };
        body.push_str(&format!(
            "<tr{}><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td><code>{}</code></td><td><code>{}</code></td><td><code>{}</code></td><td>{}</td></tr>\n",
            row_class,
            event.event_id,
            event.stage,
            event.level,
            event.result.name(),
            hex64(event.address),
            hex64(event.descriptor_value),
            hex64(event.output),
            escape(&event.purpose)
        ));
    }
    body.push_str("</table>\n");

    if let Some(perms) = &result.final_permissions {
        body.push_str("<h2>Final permissions</h2>\n<table class=\"trace\">\n");
        body.push_str("<tr><th></th><th>Read</th><th>Write</th><th>Execute</th></tr>\n");
        body.push_str(&format!(
            "<tr><th>EL0</th><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            perms.read_el0, perms.write_el0, perms.execute_el0
        ));
        body.push_str(&format!(
            "<tr><th>EL1</th><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            perms.read_el1, perms.write_el1, perms.execute_el1
        ));
        body.push_str("</table>\n");
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{} - page table walk</title>\n<style>{}</style>\n</head>\n\
         <body>\n{}</body>\n</html>\n",
        escape(&scenario.name),
        STYLE,
        body
    )
}

/// Render and save the page as `<output_dir>/<scenario_name>.html`.
pub fn save(scenario: &Scenario, result: &WalkResult, output_dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}.html", scenario.name));
    fs::write(&path, render(scenario, result))?;
    Ok(path)
}

/// Write the result JSON plus the reusable viewer template.
///
/// Returns `(template_path, json_path)`.
pub fn write_interactive(
    report: &Value,
    scenario_name: &str,
    output_dir: &Path,
) -> io::Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(output_dir)?;
    let json_path = output_dir.join(format!("{}.json", scenario_name));
    save_json(report, &json_path)?;
    let template_path = output_dir.join("walk_viewer.html");
    fs::write(&template_path, VIEWER_TEMPLATE)?;
    Ok((template_path, json_path))
}

const STYLE: &str = "\
body{font-family:monospace;margin:2em;background:#fafafa;color:#222}\
h1{font-size:1.4em}.desc{color:#555}\
.badge{padding:2px 8px;border-radius:4px;color:#fff}\
.badge.ok{background:#2a7d2a}.badge.fail{background:#b03030}\
table{border-collapse:collapse;margin:1em 0}\
th,td{border:1px solid #ccc;padding:4px 10px;text-align:left}\
th{background:#eee}\
tr.invalid td{background:#fde8e8}\
.kv th{width:10em}\
.fault{border:1px solid #b03030;background:#fde8e8;padding:8px 12px;margin:1em 0}\
code{font-family:inherit}";

const VIEWER_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Page table walk viewer</title>
<style>
body{font-family:monospace;margin:2em;background:#fafafa;color:#222}
table{border-collapse:collapse;margin:1em 0}
th,td{border:1px solid #ccc;padding:4px 10px;text-align:left}
th{background:#eee}
tr.invalid td{background:#fde8e8}
.fault{border:1px solid #b03030;background:#fde8e8;padding:8px 12px;margin:1em 0}
</style>
</head>
<body>
<h1>Page table walk viewer</h1>
<p>Load a result JSON produced by the simulator.</p>
<input type="file" id="file" accept=".json">
<div id="out"></div>
<script>
document.getElementById('file').addEventListener('change', function (ev) {
  const file = ev.target.files[0];
  if (!file) return;
  const reader = new FileReader();
  reader.onload = function () {
    try {
      render(JSON.parse(reader.result));
    } catch (err) {
      document.getElementById('out').textContent = 'Invalid JSON: ' + err;
    }
  };
  reader.readAsText(file);
});

function cell(text) { return '<td>' + text + '</td>'; }

function render(doc) {
  let html = '<h2>' + doc.scenario_name + '</h2>';
  html += '<p>' + (doc.description || '') + '</p>';
  html += '<p>Status: <strong>' + doc.result.status + '</strong>';
  if (doc.result.ipa) html += ' | IPA ' + doc.result.ipa;
  if (doc.result.final_pa) html += ' | PA ' + doc.result.final_pa;
  html += ' | ' + doc.result.total_memory_accesses + ' accesses</p>';
  if (doc.fault) {
    html += '<div class="fault"><strong>' + doc.fault.fault_type +
      '</strong> at Stage ' + doc.fault.stage + ' Level ' + doc.fault.level +
      '<br>' + doc.fault.message + '</div>';
  }
  html += '<table><tr><th>#</th><th>Stage</th><th>Level</th><th>Result</th>' +
    '<th>Descriptor PA</th><th>Descriptor</th><th>Output</th><th>Purpose</th></tr>';
  for (const e of doc.walk_trace.events) {
    const cls = e.result === 'INVALID' ? ' class="invalid"' : '';
    html += '<tr' + cls + '>' + cell(e.event_id) + cell(e.stage) + cell(e.level) +
      cell(e.result) + cell(e.address) + cell(e.descriptor_value) +
      cell(e.output) + cell(e.purpose) + '</tr>';
  }
  html += '</table>';
  document.getElementById('out').innerHTML = html;
}
</script>
</body>
</html>
"#;
