// API description handlers - GET /doc, /doc.json, /doc.md
//
// All three renderings come from API_ROUTES, which the router is checked against in tests.

use axum::{
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy)]
pub struct FieldDoc {
    pub name: &'static str,
    pub kind: &'static str,
    pub required: bool,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct RouteDoc {
    pub method: &'static str,
    pub path: &'static str,
    pub summary: &'static str,
    pub auth: bool,
    pub body: &'static [FieldDoc],
}

const GENERATION_OPTIONS: [FieldDoc; 2] = [
    FieldDoc {
        name: "generationConfig",
        kind: "object",
        required: false,
        description: "Passed to Gemini verbatim",
    },
    FieldDoc {
        name: "safetySettings",
        kind: "array",
        required: false,
        description: "List of {category, threshold}, passed verbatim",
    },
];

pub const API_ROUTES: &[RouteDoc] = &[
    RouteDoc {
        method: "GET",
        path: "/api/health",
        summary: "Liveness check",
        auth: false,
        body: &[],
    },
    RouteDoc {
        method: "GET",
        path: "/api/gemini/models",
        summary: "List of supported Gemini models",
        auth: true,
        body: &[],
    },
    RouteDoc {
        method: "POST",
        path: "/api/gemini/generate",
        summary: "Generate a course outline from keywords",
        auth: true,
        body: &[
            FieldDoc {
                name: "model",
                kind: "string",
                required: true,
                description: "Gemini model id",
            },
            FieldDoc {
                name: "keywords",
                kind: "string",
                required: true,
                description: "Topics the course should cover",
            },
            GENERATION_OPTIONS[0],
            GENERATION_OPTIONS[1],
            FieldDoc {
                name: "tools",
                kind: "array",
                required: false,
                description: "Gemini tools, passed verbatim",
            },
        ],
    },
    RouteDoc {
        method: "POST",
        path: "/api/gemini/generate-image",
        summary: "Generate an image; the file is saved and served under /images",
        auth: true,
        body: &[
            FieldDoc {
                name: "prompt",
                kind: "string",
                required: true,
                description: "Image description",
            },
            FieldDoc {
                name: "model",
                kind: "string",
                required: false,
                description: "Defaults to gemini-2.0-flash-preview-image-generation",
            },
            GENERATION_OPTIONS[0],
            GENERATION_OPTIONS[1],
        ],
    },
    RouteDoc {
        method: "POST",
        path: "/api/gemini/generate-lesson-content",
        summary: "Generate the Markdown content of one lesson",
        auth: true,
        body: &[
            FieldDoc {
                name: "lessonId",
                kind: "string",
                required: true,
                description: "Lesson identifier, echoed back",
            },
            FieldDoc {
                name: "context",
                kind: "object",
                required: true,
                description: "courseTitle, moduleTitle, lessonTitle (required), keywords, previousLessons, audience, language",
            },
            FieldDoc {
                name: "model",
                kind: "string",
                required: false,
                description: "Defaults to the configured lesson model",
            },
            GENERATION_OPTIONS[0],
            GENERATION_OPTIONS[1],
        ],
    },
];

const TITLE: &str = "Gemini Course Proxy";

fn body_schema(fields: &[FieldDoc]) -> Value {
    let mut properties = Map::new();
    for f in fields {
        properties.insert(
            f.name.to_string(),
            json!({"type": f.kind, "description": f.description}),
        );
    }
    let required: Vec<&str> = fields.iter().filter(|f| f.required).map(|f| f.name).collect();
    json!({"type": "object", "properties": properties, "required": required})
}

/// OpenAPI 3 document for the route table
pub fn openapi_document() -> Value {
    let mut paths = Map::new();
    for route in API_ROUTES {
        let mut op = json!({
            "summary": route.summary,
            "responses": {
                "200": {"description": "Success envelope"},
                "400": {"description": "Invalid input or content blocked"},
                "500": {"description": "Upstream failure"}
            }
        });
        if route.auth {
            op["security"] = json!([{"BearerAuth": []}]);
            op["responses"]["401"] = json!({"description": "Token required"});
            op["responses"]["403"] = json!({"description": "Invalid token"});
        }
        if !route.body.is_empty() {
            op["requestBody"] = json!({
                "required": true,
                "content": {"application/json": {"schema": body_schema(route.body)}}
            });
        }

        let entry = paths
            .entry(route.path.to_string())
            .or_insert_with(|| json!({}));
        entry[route.method.to_lowercase()] = op;
    }

    json!({
        "openapi": "3.0.0",
        "info": {
            "title": TITLE,
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Token-protected gateway to the Gemini API for generating course material"
        },
        "servers": [{"url": "/"}],
        "components": {
            "securitySchemes": {
                "BearerAuth": {"type": "http", "scheme": "bearer"}
            }
        },
        "paths": paths
    })
}

pub fn markdown_document() -> String {
    let mut out = format!("# {} API\n\nVersion {}\n", TITLE, env!("CARGO_PKG_VERSION"));
    out.push_str("\nProtected routes need `Authorization: Bearer <token>`.\n");
    for route in API_ROUTES {
        out.push_str(&format!("\n## {} {}\n\n{}\n", route.method, route.path, route.summary));
        if route.auth {
            out.push_str("\nAuth: bearer token\n");
        }
        if !route.body.is_empty() {
            out.push_str("\n| Field | Type | Required | Description |\n|---|---|---|---|\n");
            for f in route.body {
                out.push_str(&format!(
                    "| `{}` | {} | {} | {} |\n",
                    f.name,
                    f.kind,
                    if f.required { "yes" } else { "no" },
                    f.description
                ));
            }
        }
    }
    out
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn html_document() -> String {
    let mut sections = String::new();
    for route in API_ROUTES {
        sections.push_str(&format!(
            "<section><h2><code>{} {}</code>{}</h2><p>{}</p>",
            route.method,
            route.path,
            if route.auth { " <small>🔒</small>" } else { "" },
            escape_html(route.summary)
        ));
        if !route.body.is_empty() {
            sections.push_str("<table><tr><th>Field</th><th>Type</th><th>Required</th><th>Description</th></tr>");
            for f in route.body {
                sections.push_str(&format!(
                    "<tr><td><code>{}</code></td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    f.name,
                    f.kind,
                    if f.required { "yes" } else { "no" },
                    escape_html(f.description)
                ));
            }
            sections.push_str("</table>");
        }
        sections.push_str("</section>");
    }

    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>body{{font-family:sans-serif;max-width:60rem;margin:2rem auto}}\
         table{{border-collapse:collapse}}td,th{{border:1px solid #ccc;padding:.3rem .6rem}}</style>\
         </head><body><h1>{title}</h1><p>Version {version}. \
         Machine-readable: <a href=\"/doc.json\">/doc.json</a>, <a href=\"/doc.md\">/doc.md</a></p>\
         {sections}</body></html>",
        title = TITLE,
        version = env!("CARGO_PKG_VERSION"),
        sections = sections
    )
}

/// GET /doc
pub async fn handle_doc_html() -> Html<String> {
    Html(html_document())
}

/// GET /doc.json
pub async fn handle_doc_json() -> Json<Value> {
    Json(openapi_document())
}

/// GET /doc.md
pub async fn handle_doc_markdown() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        markdown_document(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = openapi_document();
        for route in API_ROUTES {
            let op = &doc["paths"][route.path][route.method.to_lowercase()];
            assert!(op.is_object(), "missing {} {}", route.method, route.path);
            assert_eq!(op.get("security").is_some(), route.auth);
        }
    }

    #[test]
    fn test_openapi_required_fields() {
        let doc = openapi_document();
        let schema = &doc["paths"]["/api/gemini/generate"]["post"]["requestBody"]["content"]
            ["application/json"]["schema"];
        assert_eq!(schema["required"], json!(["model", "keywords"]));
        assert_eq!(schema["properties"]["tools"]["type"], "array");
    }

    #[test]
    fn test_markdown_and_html_mention_every_path() {
        let md = markdown_document();
        let html = html_document();
        for route in API_ROUTES {
            assert!(md.contains(route.path));
            assert!(html.contains(route.path));
        }
        assert!(md.contains("| `keywords` | string | yes |"));
    }
}
