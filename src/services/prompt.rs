//! Prompt assembly for the AI gateways. Every builder is a pure function of
//! its parameter record: optional fields contribute a line only when
//! present, nothing else is conditional.

use crate::models::design::{ContainerParams, DesignParams, PoolParams};

/// Text prompt for the design-description model. Asks for strict JSON so
/// the gateway can parse the reply without scraping prose.
pub fn design_prompt(params: &DesignParams) -> String {
    let mut prompt = format!(
        "You are a senior designer at a custom carpentry and remodeling studio. \
         Describe a bespoke {tipo} built from {material}, finished in {color}, \
         in a {estilo} style.",
        tipo = params.tipo,
        material = params.material,
        color = params.color,
        estilo = params.estilo,
    );
    if let Some(medidas) = &params.medidas {
        prompt.push_str(&format!(" The piece measures {} cm.", medidas));
    }
    if let Some(extra) = &params.extra {
        prompt.push_str(&format!(" Additional requirements: {}.", extra));
    }
    prompt.push_str(
        " Respond with a JSON object only, no prose, with keys: \
         \"description\" (2-3 sentences for the client), \
         \"materials\" (array of material names needed for the build), \
         \"estimatedTime\" (a delivery window such as \"4-6 semanas\").",
    );
    prompt
}

/// Prompt for the image model. Plain English scene description.
pub fn image_prompt(params: &DesignParams) -> String {
    let mut prompt = format!(
        "Photorealistic architectural photography of a custom {tipo} made of \
         {material}, {color} finish, {estilo} style, professionally lit, \
         high-end residential setting",
        tipo = params.tipo,
        material = params.material,
        color = params.color,
        estilo = params.estilo,
    );
    if let Some(medidas) = &params.medidas {
        prompt.push_str(&format!(", proportions {} cm", medidas));
    }
    if let Some(extra) = &params.extra {
        prompt.push_str(&format!(", {}", extra));
    }
    prompt
}

/// Prompt for the cost-estimation model.
pub fn cost_prompt(params: &DesignParams) -> String {
    let mut prompt = format!(
        "Estimate the production cost for a custom {tipo} in {material}, \
         {color}, {estilo} style, for the Mexican market.",
        tipo = params.tipo,
        material = params.material,
        color = params.color,
        estilo = params.estilo,
    );
    if let Some(medidas) = &params.medidas {
        prompt.push_str(&format!(" Dimensions: {} cm.", medidas));
    }
    if let Some(extra) = &params.extra {
        prompt.push_str(&format!(" Extras: {}.", extra));
    }
    prompt.push_str(
        " Respond with a JSON object only, with keys: \"min\" (number, MXN), \
         \"max\" (number, MXN), \"currency\" (\"MXN\"), \"breakdown\" (array of \
         {\"concepto\", \"costo\"} line items), \"notes\" (one sentence).",
    );
    prompt
}

/// Prompt for Gemini design suggestions.
pub fn suggestions_prompt(params: &DesignParams) -> String {
    let mut prompt = format!(
        "Suggest design directions for a {tipo} project. Base material: \
         {material}. Base color: {color}. Style reference: {estilo}.",
        tipo = params.tipo,
        material = params.material,
        color = params.color,
        estilo = params.estilo,
    );
    if let Some(extra) = &params.extra {
        prompt.push_str(&format!(" Client notes: {}.", extra));
    }
    prompt.push_str(
        " Respond with a JSON object only, with keys: \"description\", \
         \"style\", \"materials\" (array), \"colors\" (array), \
         \"recommendations\" (array of short actionable tips).",
    );
    prompt
}

/// Smart Container line feeds the generic design flow through its own
/// template.
pub fn container_prompt(params: &ContainerParams) -> String {
    let mut prompt = format!(
        "Describe a Smart Container conversion for {uso} use, container size \
         {dimensiones}.",
        uso = params.uso,
        dimensiones = params.dimensiones,
    );
    if let Some(acabados) = &params.acabados {
        prompt.push_str(&format!(" Interior finishes: {}.", acabados));
    }
    if let Some(energia) = &params.energia {
        prompt.push_str(&format!(" Energy setup: {}.", energia));
    }
    if let Some(extras) = &params.extras {
        prompt.push_str(&format!(" Extras: {}.", extras));
    }
    prompt.push_str(
        " Respond with a JSON object only, with keys: \"description\", \
         \"materials\" (array), \"estimatedTime\".",
    );
    prompt
}

pub fn container_image_prompt(params: &ContainerParams) -> String {
    let mut prompt = format!(
        "Photorealistic exterior render of a converted shipping container for \
         {uso} use, size {dimensiones}, modern landscaping, golden hour light",
        uso = params.uso,
        dimensiones = params.dimensiones,
    );
    if let Some(acabados) = &params.acabados {
        prompt.push_str(&format!(", {} finishes", acabados));
    }
    prompt
}

pub fn pool_image_prompt(params: &PoolParams) -> String {
    let mut prompt = format!(
        "Photorealistic render of a modular {forma} pool, size {tamano}, in a \
         landscaped residential garden, clear water, afternoon light",
        forma = params.forma,
        tamano = params.tamano,
    );
    if let Some(acabados) = &params.acabados {
        prompt.push_str(&format!(", {} finish", acabados));
    }
    prompt
}

/// Modular Pool line.
pub fn pool_prompt(params: &PoolParams) -> String {
    let mut prompt = format!(
        "Describe a modular pool, {forma} shape, size {tamano}.",
        forma = params.forma,
        tamano = params.tamano,
    );
    if let Some(profundidad) = &params.profundidad {
        prompt.push_str(&format!(" Depth: {}.", profundidad));
    }
    if let Some(acabados) = &params.acabados {
        prompt.push_str(&format!(" Finishes: {}.", acabados));
    }
    if let Some(extras) = &params.extras {
        prompt.push_str(&format!(" Extras: {}.", extras));
    }
    prompt.push_str(
        " Respond with a JSON object only, with keys: \"description\", \
         \"materials\" (array), \"estimatedTime\".",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DesignParams {
        DesignParams {
            tipo: "puerta".to_string(),
            material: "roble".to_string(),
            color: "blanco".to_string(),
            estilo: "moderno".to_string(),
            medidas: Some("80x200".to_string()),
            extra: None,
        }
    }

    #[test]
    fn builders_are_deterministic() {
        assert_eq!(design_prompt(&params()), design_prompt(&params()));
        assert_eq!(image_prompt(&params()), image_prompt(&params()));
        assert_eq!(cost_prompt(&params()), cost_prompt(&params()));
        assert_eq!(suggestions_prompt(&params()), suggestions_prompt(&params()));
    }

    #[test]
    fn optional_fields_only_appear_when_present() {
        let with_dims = design_prompt(&params());
        assert!(with_dims.contains("80x200"));

        let mut no_dims = params();
        no_dims.medidas = None;
        assert!(!design_prompt(&no_dims).contains("80x200"));
    }

    #[test]
    fn container_and_pool_builders_are_deterministic() {
        let container = ContainerParams {
            uso: "oficina".to_string(),
            dimensiones: "20 pies".to_string(),
            acabados: Some("madera clara".to_string()),
            energia: Some("solar".to_string()),
            extras: None,
        };
        let pool = PoolParams {
            forma: "rectangular".to_string(),
            tamano: "8x4".to_string(),
            profundidad: Some("1.5m".to_string()),
            acabados: None,
            extras: None,
        };
        assert_eq!(container_prompt(&container), container_prompt(&container));
        assert_eq!(pool_prompt(&pool), pool_prompt(&pool));
        assert!(container_image_prompt(&container).contains("20 pies"));
        assert!(pool_image_prompt(&pool).contains("rectangular"));
    }

    #[test]
    fn every_builder_mentions_all_required_fields() {
        let p = params();
        for prompt in [design_prompt(&p), image_prompt(&p), cost_prompt(&p)] {
            assert!(prompt.contains("puerta"));
            assert!(prompt.contains("roble"));
            assert!(prompt.contains("blanco"));
            assert!(prompt.contains("moderno"));
        }
    }
}
