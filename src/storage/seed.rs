use serde_json::json;

use crate::models::catalog::{NewDistributor, NewMaterial};

/// Sample catalog loaded on first start. Mirrors the studio's launch
/// inventory; production replaces this through the database directly.
pub fn seed_distributors() -> Vec<NewDistributor> {
    vec![
        NewDistributor {
            name: "Maderas del Norte".to_string(),
            location: "Monterrey, MX".to_string(),
            description: Some("Hardwood supplier for doors and cabinetry".to_string()),
            status: "active".to_string(),
            image_url: None,
            contact_info: json!({
                "phone": "+52 81 5555 0101",
                "email": "ventas@maderasdelnorte.mx"
            }),
        },
        NewDistributor {
            name: "Aluminios y Vidrios Serena".to_string(),
            location: "Guadalajara, MX".to_string(),
            description: Some("Aluminum profiles and tempered glass".to_string()),
            status: "active".to_string(),
            image_url: None,
            contact_info: json!({
                "phone": "+52 33 5555 0202",
                "email": "contacto@avserena.mx"
            }),
        },
        NewDistributor {
            name: "Superficies Modernas".to_string(),
            location: "Ciudad de México, MX".to_string(),
            description: Some("Stone and quartz countertop surfaces".to_string()),
            status: "active".to_string(),
            image_url: None,
            contact_info: json!({
                "phone": "+52 55 5555 0303",
                "email": "cotizaciones@superficiesmodernas.mx"
            }),
        },
    ]
}

pub fn seed_materials(distributor_ids: &[i64]) -> Vec<NewMaterial> {
    let wood = distributor_ids.first().copied().unwrap_or(1);
    let metal = distributor_ids.get(1).copied().unwrap_or(wood);
    let stone = distributor_ids.get(2).copied().unwrap_or(wood);

    vec![
        NewMaterial {
            name: "Roble macizo".to_string(),
            category: "madera".to_string(),
            material_type: "puerta".to_string(),
            color: "natural".to_string(),
            finish: "mate".to_string(),
            unit: "m2".to_string(),
            price: 1450.0,
            availability: "available".to_string(),
            distributor_id: wood,
            image_url: None,
        },
        NewMaterial {
            name: "Nogal americano".to_string(),
            category: "madera".to_string(),
            material_type: "gabinete".to_string(),
            color: "oscuro".to_string(),
            finish: "satinado".to_string(),
            unit: "m2".to_string(),
            price: 1890.0,
            availability: "limited".to_string(),
            distributor_id: wood,
            image_url: None,
        },
        NewMaterial {
            name: "Pino tratado".to_string(),
            category: "madera".to_string(),
            material_type: "puerta".to_string(),
            color: "claro".to_string(),
            finish: "barniz".to_string(),
            unit: "m2".to_string(),
            price: 620.0,
            availability: "available".to_string(),
            distributor_id: wood,
            image_url: None,
        },
        NewMaterial {
            name: "Perfil de aluminio anodizado".to_string(),
            category: "metal".to_string(),
            material_type: "ventana".to_string(),
            color: "plata".to_string(),
            finish: "anodizado".to_string(),
            unit: "ml".to_string(),
            price: 310.0,
            availability: "available".to_string(),
            distributor_id: metal,
            image_url: None,
        },
        NewMaterial {
            name: "Vidrio templado 6mm".to_string(),
            category: "vidrio".to_string(),
            material_type: "ventana".to_string(),
            color: "transparente".to_string(),
            finish: "pulido".to_string(),
            unit: "m2".to_string(),
            price: 540.0,
            availability: "available".to_string(),
            distributor_id: metal,
            image_url: None,
        },
        NewMaterial {
            name: "Cuarzo blanco estelar".to_string(),
            category: "piedra".to_string(),
            material_type: "cocina".to_string(),
            color: "blanco".to_string(),
            finish: "pulido".to_string(),
            unit: "m2".to_string(),
            price: 2350.0,
            availability: "limited".to_string(),
            distributor_id: stone,
            image_url: None,
        },
        NewMaterial {
            name: "Granito gris tormenta".to_string(),
            category: "piedra".to_string(),
            material_type: "cocina".to_string(),
            color: "gris".to_string(),
            finish: "flameado".to_string(),
            unit: "m2".to_string(),
            price: 1780.0,
            availability: "available".to_string(),
            distributor_id: stone,
            image_url: None,
        },
    ]
}
