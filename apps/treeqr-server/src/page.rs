//! HTML page for a single tree
//!
//! Deliberately plain markup; styling lives in `/static/style.css` when the static
//! directory provides one. All record text is escaped before it lands in the page.

use treeqr_core::record::Attributes;
use treeqr_core::Record;

const STORY_SCRIPT: &str = r#"
const treeId = __TREE_ID__;
const button = document.getElementById("story-button");
const story = document.getElementById("story");
button.addEventListener("click", async () => {
  button.disabled = true;
  story.textContent = "Listening to the tree...";
  try {
    const res = await fetch("/generate-description/" + encodeURIComponent(treeId));
    if (!res.ok) throw new Error(res.status);
    const text = await res.text();
    story.textContent = text;
    new Audio("/speak?text=" + encodeURIComponent(text)).play().catch(() => {});
  } catch (_) {
    story.textContent = "The tree is quiet right now. Please try again later.";
  } finally {
    button.disabled = false;
  }
});
"#;

/// Render the page for `record`, fetched under `id`
pub fn render(id: &str, record: &Record) -> String {
    let title = if record.name.is_empty() {
        id
    } else {
        record.name.as_str()
    };

    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape(title)));
    html.push_str("<link rel=\"stylesheet\" href=\"/static/style.css\">\n");
    html.push_str("</head>\n<body>\n<main class=\"tree\">\n");

    html.push_str(&format!("<h1>{}</h1>\n", escape(title)));
    if !record.botanical.is_empty() {
        html.push_str(&format!(
            "<p class=\"botanical\"><em>{}</em></p>\n",
            escape(&record.botanical)
        ));
    }

    let tags: Vec<String> = [&record.category, &record.native]
        .into_iter()
        .filter(|t| !t.is_empty())
        .map(|t| format!("<span class=\"tag\">{}</span>", escape(t)))
        .collect();
    if !tags.is_empty() {
        html.push_str(&format!("<p class=\"tags\">{}</p>\n", tags.join(" ")));
    }

    html.push_str(&gallery(record.images()));
    html.push_str(&text_section("About", &record.description));

    html.push_str("<section class=\"story\">\n");
    html.push_str("<button id=\"story-button\" type=\"button\">Hear my story</button>\n");
    html.push_str("<p id=\"story\" aria-live=\"polite\"></p>\n");
    html.push_str("</section>\n");

    html.push_str(&text_section(
        "Environmental benefits",
        &record.environmental_benefits,
    ));
    html.push_str(&text_section("Medicinal benefits", &record.medicinal_benefits));
    html.push_str(&attribute_section("Classification", record.classification()));
    html.push_str(&attribute_section("Location", record.location()));

    html.push_str("<footer>\n");
    if !record.volunteer.is_empty() {
        html.push_str(&format!(
            "<p>Tagged by {}</p>\n",
            escape(&record.volunteer)
        ));
    }
    if !record.last_updated.is_empty() {
        html.push_str(&format!(
            "<p>Last updated {}</p>\n",
            escape(&record.last_updated)
        ));
    }
    html.push_str("</footer>\n</main>\n");

    html.push_str("<script>");
    html.push_str(&STORY_SCRIPT.replace("__TREE_ID__", &script_string(id)));
    html.push_str("</script>\n</body>\n</html>\n");
    html
}

fn text_section(heading: &str, text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    format!(
        "<section>\n<h2>{}</h2>\n<p>{}</p>\n</section>\n",
        heading,
        escape(text)
    )
}

fn attribute_section(heading: &str, attributes: &Attributes) -> String {
    if attributes.is_empty() {
        return String::new();
    }
    let rows: String = attributes
        .iter()
        .map(|(k, v)| format!("<dt>{}</dt><dd>{}</dd>\n", escape(&label(k)), escape(v)))
        .collect();
    format!(
        "<section>\n<h2>{}</h2>\n<dl>\n{}</dl>\n</section>\n",
        heading, rows
    )
}

fn gallery(images: &[Attributes]) -> String {
    let figures: String = images
        .iter()
        .filter_map(|image| {
            let url = image.get("url").filter(|u| !u.is_empty())?;
            let caption = image.get("caption").map(String::as_str).unwrap_or("");
            let figcaption = if caption.is_empty() {
                String::new()
            } else {
                format!("<figcaption>{}</figcaption>", escape(caption))
            };
            Some(format!(
                "<figure><img src=\"{}\" alt=\"{}\" loading=\"lazy\">{}</figure>\n",
                escape(url),
                escape(caption),
                figcaption
            ))
        })
        .collect();

    if figures.is_empty() {
        return String::new();
    }
    format!("<section class=\"gallery\">\n{}</section>\n", figures)
}

/// `scientificName` -> `Scientific name`
fn label(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            out.push(' ');
            out.extend(c.to_lowercase());
        } else if c == '_' {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

/// JSON string literal that is safe inside a `<script>` element
fn script_string(value: &str) -> String {
    serde_json::Value::from(value)
        .to_string()
        .replace("</", "<\\/")
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
