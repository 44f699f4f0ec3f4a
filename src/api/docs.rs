/// Generate Markdown documentation for the public API.
pub fn generate_markdown_docs() -> String {
    let mut markdown = String::new();

    markdown.push_str("# Kasa Serena API Documentation\n\n");
    markdown.push_str("## Overview\n\n");
    markdown.push_str("Kasa Serena Designs is a custom design and remodeling studio. This API backs the public site: account management, design projects, material catalog, quote requests, and AI-assisted design generation (OpenAI and Google Gemini).\n\n");

    markdown.push_str("## Table of Contents\n\n");
    markdown.push_str("- [Authentication](#authentication)\n");
    markdown.push_str("- [Projects](#projects)\n");
    markdown.push_str("- [Catalog](#catalog)\n");
    markdown.push_str("- [Quotes](#quotes)\n");
    markdown.push_str("- [AI Design Tools](#ai-design-tools)\n");
    markdown.push_str("- [Rate Limits](#rate-limits)\n");
    markdown.push_str("- [Error Codes](#error-codes)\n\n");

    markdown.push_str("## Authentication\n\n");
    markdown.push_str("Sessions are cookie-based. Register or login to receive a `kasa_session` HttpOnly cookie valid for 24 hours. Non-browser clients may instead send the returned token as a bearer header:\n\n");
    markdown.push_str("```http\nAuthorization: Bearer <session-token>\n```\n\n");

    markdown.push_str("### POST /api/register\n\n");
    markdown.push_str("**Description:** Create an account and open a session\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"username\": \"marta\",\n  \"email\": \"marta@example.com\",\n  \"password\": \"a-strong-password\",\n  \"fullName\": \"Marta López\",\n  \"isProfessional\": false\n}\n```\n\n");
    markdown.push_str("**Response:**\n```json\n{\n  \"user\": { \"id\": 1, \"username\": \"marta\", \"email\": \"marta@example.com\", \"role\": \"user\" },\n  \"token\": \"uuid\",\n  \"expiresIn\": 86400\n}\n```\n\n");

    markdown.push_str("### POST /api/login\n\n");
    markdown.push_str("**Description:** Authenticate with username or email\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"usernameOrEmail\": \"marta\",\n  \"password\": \"a-strong-password\"\n}\n```\n\n");

    markdown.push_str("### POST /api/logout\n\n");
    markdown.push_str("**Description:** Revoke the current session and clear the cookie\n\n");

    markdown.push_str("### GET /api/user\n\n");
    markdown.push_str("**Description:** The current session's user, 401 if not logged in\n\n");

    markdown.push_str("## Projects\n\n");
    markdown.push_str("All project endpoints require a session. Updates and deletes are owner-only.\n\n");

    markdown.push_str("### POST /api/projects\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"name\": \"Cocina integral\",\n  \"type\": \"cocina\",\n  \"description\": \"Remodelación completa\",\n  \"status\": \"draft\"\n}\n```\n\n");
    markdown.push_str("Valid types: `cocina`, `puerta`, `ventana`, `gabinete`, `contenedor`, `piscina`, `oficina`. Valid statuses: `draft`, `in_progress`, `completed`.\n\n");

    markdown.push_str("### GET /api/projects\n\n**Description:** All projects\n\n");
    markdown.push_str("### GET /api/projects/user\n\n**Description:** The session user's projects\n\n");
    markdown.push_str("### GET /api/projects/{id}\n\n**Description:** One project, 404 on miss\n\n");
    markdown.push_str("### PUT /api/projects/{id}\n\n**Description:** Partial update, 403 unless owner\n\n");
    markdown.push_str("### DELETE /api/projects/{id}\n\n**Description:** Delete, 403 unless owner\n\n");

    markdown.push_str("## Catalog\n\n");
    markdown.push_str("### GET /api/materials\n\n**Description:** Material catalog (public)\n\n");
    markdown.push_str("### GET /api/materials/type/{type}\n\n**Description:** Materials filtered by project type\n\n");
    markdown.push_str("### GET /api/distributors\n\n**Description:** Distributor list (public)\n\n");
    markdown.push_str("### GET /api/distributors/{id}\n\n**Description:** One distributor\n\n");
    markdown.push_str("### POST /api/contact\n\n");
    markdown.push_str("**Description:** Contact form (public)\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"name\": \"Juan\",\n  \"email\": \"juan@example.com\",\n  \"subject\": \"Cotización\",\n  \"message\": \"Quiero una puerta de roble\",\n  \"subscribed\": true\n}\n```\n\n");

    markdown.push_str("## Quotes\n\n");
    markdown.push_str("### POST /api/quotes\n\n");
    markdown.push_str("**Description:** Submit a quote request (session required)\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"projectId\": 12,\n  \"details\": {\n    \"tipo\": \"cocina\",\n    \"materiales\": [\"cuarzo\", \"nogal\"],\n    \"medidas\": \"400x300\"\n  }\n}\n```\n\n");
    markdown.push_str("### GET /api/quotes\n\n**Description:** The session user's quotes\n\n");
    markdown.push_str("### PUT /api/quotes/{id}/status\n\n**Description:** Admin review: `pending` → `approved`/`rejected`, optionally setting `totalCost`\n\n");

    markdown.push_str("## AI Design Tools\n\n");
    markdown.push_str("Generation endpoints degrade gracefully: if the AI provider fails, a reference design/estimate is returned instead of an error.\n\n");

    markdown.push_str("### POST /api/design-generator\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"tipo\": \"puerta\",\n  \"material\": \"roble\",\n  \"color\": \"blanco\",\n  \"estilo\": \"moderno\",\n  \"medidas\": \"80x200\"\n}\n```\n\n");
    markdown.push_str("**Response:**\n```json\n{\n  \"imageUrl\": \"https://...\",\n  \"description\": \"...\",\n  \"materials\": [\"Roble\", \"Herrajes\"],\n  \"estimatedTime\": \"4-6 semanas\"\n}\n```\n\n");

    markdown.push_str("### POST /api/generate-preview\n\n**Description:** Image only\n\n");
    markdown.push_str("### POST /api/estimate-cost\n\n");
    markdown.push_str("**Response:**\n```json\n{\n  \"estimatedCost\": { \"min\": 15000, \"max\": 45000, \"currency\": \"MXN\" },\n  \"breakdown\": [ { \"concepto\": \"Materiales\", \"costo\": 18000 } ],\n  \"notes\": \"...\"\n}\n```\n\n");
    markdown.push_str("### POST /api/design-suggestions\n\n**Description:** Gemini suggestions: description, style, materials, colors, recommendations\n\n");
    markdown.push_str("### POST /api/smart-container\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"uso\": \"oficina\",\n  \"dimensiones\": \"20 pies\",\n  \"acabados\": \"madera clara\",\n  \"energia\": \"solar\"\n}\n```\n\n");
    markdown.push_str("### POST /api/modular-pool\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"forma\": \"rectangular\",\n  \"tamano\": \"8x4\",\n  \"profundidad\": \"1.5m\"\n}\n```\n\n");
    markdown.push_str("### POST /api/design-chat\n\n**Description:** Public design assistant chat\n\n");
    markdown.push_str("### POST /api/analyze-image\n\n**Description:** Multipart upload (`image` field), GPT-4o vision analysis\n\n");
    markdown.push_str("### POST /api/analyze-image-gemini\n\n**Description:** Multipart upload, Gemini vision analysis\n\n");
    markdown.push_str("### POST /api/convert-heic\n\n**Description:** Multipart HEIC upload, returns JPEG bytes. 10 MB cap.\n\n");

    markdown.push_str("## Rate Limits\n\n");
    markdown.push_str("| Scope | Limit |\n|-------|-------|\n");
    markdown.push_str("| General API | 100 requests / 15 minutes |\n");
    markdown.push_str("| Register & login | 10 requests / hour |\n");
    markdown.push_str("| AI generation | 30 requests / hour |\n");
    markdown.push_str("| Quotes | 20 requests / day |\n\n");
    markdown.push_str("Exceeding a limit returns `429 Too Many Requests`.\n\n");

    markdown.push_str("## Error Codes\n\n");
    markdown.push_str("| Status | Meaning |\n|--------|--------|\n");
    markdown.push_str("| 400 | Validation failure (details in `error`) |\n");
    markdown.push_str("| 401 | Missing or invalid session |\n");
    markdown.push_str("| 403 | Ownership or role mismatch |\n");
    markdown.push_str("| 404 | Resource not found |\n");
    markdown.push_str("| 429 | Rate limit exceeded |\n");
    markdown.push_str("| 500 | Internal or AI provider error |\n");

    markdown
}

/// Landing page linking the interactive documentation variants.
pub fn generate_documentation_html() -> String {
    r#"<!DOCTYPE html>
<html>
<head>
    <title>Kasa Serena API Documentation</title>
    <meta charset="utf-8"/>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
        body { font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; margin: 0; background: #f7f5f2; color: #2b2b2b; }
        .wrap { max-width: 720px; margin: 60px auto; padding: 0 24px; }
        h1 { font-weight: 600; }
        a.card { display: block; background: #fff; border: 1px solid #e3ded7; border-radius: 8px; padding: 18px 22px; margin: 14px 0; text-decoration: none; color: inherit; }
        a.card:hover { border-color: #b89b72; }
        .card h2 { margin: 0 0 6px; font-size: 18px; }
        .card p { margin: 0; color: #6b6457; font-size: 14px; }
    </style>
</head>
<body>
    <div class="wrap">
        <h1>Kasa Serena API</h1>
        <p>Backend for the Kasa Serena Designs studio: accounts, projects, quotes and AI design generation.</p>
        <a class="card" href="/api/docs"><h2>Swagger UI</h2><p>Interactive endpoint explorer</p></a>
        <a class="card" href="/api/redoc"><h2>Redoc</h2><p>Reference-style documentation</p></a>
        <a class="card" href="/docs/openapi.json"><h2>OpenAPI JSON</h2><p>Machine-readable specification</p></a>
        <a class="card" href="/docs/markdown"><h2>Markdown</h2><p>Downloadable documentation</p></a>
    </div>
</body>
</html>"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_mentions_every_route_group() {
        let docs = generate_markdown_docs();
        for needle in [
            "/api/register",
            "/api/projects",
            "/api/materials",
            "/api/quotes",
            "/api/design-generator",
            "/api/convert-heic",
            "429",
        ] {
            assert!(docs.contains(needle), "missing {}", needle);
        }
    }
}
