//! The single page served at `/`.

use crate::image_source::{NO_PRESET, UPLOAD_EXTENSIONS};

pub const PAGE_TITLE: &str = "PlateMate - Your Culinary Assistant";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{{TITLE}}</title>
<style>
  body { margin: 0; font-family: "Helvetica Neue", Arial, sans-serif; background: #f9f9f9; }
  main { max-width: 720px; margin: 0 auto; padding: 1em; }
  h1 { text-align: center; font-size: 2.5em; margin-bottom: 0.5em; color: #333; }
  h2, h3 { color: #555; margin-bottom: 0.5em; }
  img { max-width: 100%; height: auto; border-radius: 8px; }
  .banner { width: 60%; margin: 0 auto; display: block; }
  .presets { display: flex; flex-wrap: wrap; gap: 10px; justify-content: center; margin: 1em 0; }
  .presets img { width: 80px; height: 80px; object-fit: cover; cursor: pointer; border: 2px solid transparent; }
  .presets img:hover { border: 2px solid #007BFF; }
  .notice { padding: 0.75em 1em; border-radius: 6px; margin: 0.5em 0; }
  .notice.info { background: #e7f1ff; color: #084298; }
  .notice.warning { background: #fff3cd; color: #664d03; }
  .notice.error { background: #f8d7da; color: #842029; }
  .stage-error { color: #842029; }
  button { padding: 0.6em 1.4em; font-size: 1em; }
  button:disabled { opacity: 0.5; }
  @media (max-width: 600px) {
    h1 { font-size: 1.8em; }
    h2, h3 { font-size: 1em; }
    button { width: 100%; }
  }
</style>
</head>
<body>
<main>
  <h1>{{TITLE}}</h1>
  {{BANNER}}
  <div class="presets">{{PRESET_THUMBNAILS}}</div>
  <label for="preset">Or choose a preset sample image:</label>
  <select id="preset">{{PRESET_OPTIONS}}</select>
  <div id="upload-row">
    <input type="file" id="upload" accept="{{ACCEPT}}">
  </div>
  <div id="notices"></div>
  <figure id="selected" hidden>
    <img id="selected-img" alt="Selected Image">
    <figcaption>Selected Image</figcaption>
  </figure>
  <button id="classify" disabled>Classify</button>
  <p id="spinner" hidden>Classifying...</p>
  <section id="results" hidden>
    <h2 id="header"></h2>
    <h3>📝 Ingredients</h3>
    <p id="ingredients"></p>
    <h3>💡 Healthier Alternatives</h3>
    <p id="recommendation"></p>
  </section>
</main>
<script>
let sessionId = null;
const $ = (id) => document.getElementById(id);

function render(view) {
  const notices = $("notices");
  notices.replaceChildren(...view.notices.map((n) => {
    const div = document.createElement("div");
    div.className = "notice " + n.level;
    div.textContent = n.message;
    return div;
  }));
  $("classify").disabled = !view.can_classify;
  $("selected").hidden = !view.image;
  const report = view.report;
  $("results").hidden = !report;
  if (report) {
    $("header").textContent = report.header;
    for (const key of ["ingredients", "recommendation"]) {
      const el = $(key);
      el.textContent = report[key].text;
      el.className = report[key].status === "completed" ? "" : "stage-error";
    }
  }
}

async function call(path, options) {
  const response = await fetch("/api/sessions/" + sessionId + path, options);
  render(await response.json());
}

async function select() {
  const form = new FormData();
  const preset = $("preset").value;
  form.append("preset", preset);
  $("upload-row").hidden = preset !== "{{NO_PRESET}}";
  const file = $("upload").files[0];
  if (preset === "{{NO_PRESET}}" && file) {
    form.append("file", file, file.name);
    $("selected-img").src = URL.createObjectURL(file);
  } else if (preset !== "{{NO_PRESET}}") {
    $("selected-img").src = "/presets/" + encodeURIComponent(preset);
  }
  await call("/image", { method: "POST", body: form });
}

async function classify() {
  $("classify").disabled = true;
  $("spinner").hidden = false;
  try {
    await call("/classify", { method: "POST" });
  } finally {
    $("spinner").hidden = true;
  }
}

document.querySelectorAll(".presets img").forEach((img) => {
  img.addEventListener("click", () => { $("preset").value = img.dataset.preset; select(); });
});
$("preset").addEventListener("change", select);
$("upload").addEventListener("change", select);
$("classify").addEventListener("click", classify);

fetch("/api/sessions", { method: "POST" })
  .then((r) => r.json())
  .then((s) => { sessionId = s.session_id; return call("", {}); });
</script>
</body>
</html>
"#;

/// Render the page for the given preset names. `banner` is the banner file name
/// and whether it exists.
pub fn render_page<'a, I>(presets: I, banner: (&str, bool)) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let presets: Vec<&str> = presets.into_iter().collect();

    let mut options = format!(r#"<option value="{0}">{0}</option>"#, NO_PRESET);
    let mut thumbnails = String::new();
    for name in &presets {
        let name = escape_html(name);
        options.push_str(&format!(r#"<option value="{0}">{0}</option>"#, name));
        thumbnails.push_str(&format!(
            r#"<img src="/presets/{0}" alt="{0}" data-preset="{0}">"#,
            name
        ));
    }

    let (banner_name, banner_present) = banner;
    let banner_html = if banner_present {
        r#"<img class="banner" src="/banner" alt="PlateMate banner">"#.to_string()
    } else {
        format!(
            r#"<div class="notice warning">Banner image '{}' not found.</div>"#,
            escape_html(banner_name)
        )
    };

    let accept = UPLOAD_EXTENSIONS
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",");

    TEMPLATE
        .replace("{{TITLE}}", PAGE_TITLE)
        .replace("{{BANNER}}", &banner_html)
        .replace("{{PRESET_OPTIONS}}", &options)
        .replace("{{PRESET_THUMBNAILS}}", &thumbnails)
        .replace("{{ACCEPT}}", &accept)
        .replace("{{NO_PRESET}}", NO_PRESET)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
