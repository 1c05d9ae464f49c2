//! Sensitivity-pack catalog: seeded products, display order, owner edits.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{SensiError, SensiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Pc,
}

/// Declaration order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Silver,
    Gold,
    Diamond,
    Legendary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub image_url: String,
    pub description: String,
    pub platform: Platform,
    pub tier: Tier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<u32>,
}

impl Product {
    /// Pre-discount price shown struck through, when a discount applies.
    pub fn original_price(&self) -> Option<f64> {
        match self.discount {
            Some(d) if d > 0 && d < 100 => Some(self.price / (1.0 - f64::from(d) / 100.0)),
            _ => None,
        }
    }
}

/// Owner input for a new product; the id is assigned on insert.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    pub platform: Platform,
    pub tier: Tier,
    #[serde(default)]
    pub discount: Option<u32>,
}

/// Shallow partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub platform: Option<Platform>,
    pub tier: Option<Tier>,
    pub discount: Option<u32>,
}

#[allow(clippy::too_many_arguments)]
fn seed(
    id: &str,
    name: &str,
    price: f64,
    image: &str,
    description: &str,
    platform: Platform,
    tier: Tier,
    discount: Option<u32>,
) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        price,
        image_url: format!("https://i.postimg.cc/{}", image),
        description: description.to_string(),
        platform,
        tier,
        discount,
    }
}

/// The twelve packs the store opens with.
pub fn seed_products() -> Vec<Product> {
    use Platform::*;
    use Tier::*;
    vec![
        seed("android-silver", "Android Sensitivity (Silver)", 300.0,
            "Vvv38Bfc/Loading-Sensi-Pack-Design-Android-Silver-Upscaled.jpg",
            "Get started with optimized sensitivity settings for your Android device.",
            Android, Silver, None),
        seed("android-gold", "Android Sensitivity (Gold)", 800.0,
            "2y5f5NxM/Loading-Sensi-Pack-Design-Android-Gold-Upscaled.jpg",
            "Advanced sensitivity settings for better control and accuracy on Android.",
            Android, Gold, Some(10)),
        seed("android-diamond", "Android Sensitivity (Diamond)", 1200.0,
            "W4PLkknM/Loading-Sensi-Pack-Design-Android-Diamond-Upscaled.jpg",
            "Pro-level sensitivity and custom configuration to master your Android gameplay.",
            Android, Diamond, None),
        seed("android-legendary", "Android Sensitivity (Legendary)", 2000.0,
            "152ZyTV7/Loading-Sensi-Pack-Design-Android-Legendary-Upscaled.jpg",
            "Unlock the ultimate performance with fully personalized legendary settings for Android.",
            Android, Legendary, Some(15)),
        seed("pc-silver", "PC Settings (Silver)", 1000.0,
            "KzJdwsyN/Loading-Sensi-Pack-Design-PCSilver-Upscaled.jpg",
            "Fundamental sensitivity settings to improve your PC gaming experience.",
            Pc, Silver, None),
        seed("pc-gold", "PC Settings & Gameplay Tricks (Gold)", 1500.0,
            "LXDpR8jj/Loading-Sensi-Pack-Design-PCGold-Upscaled.jpg",
            "Advanced settings, gameplay tricks, and drag techniques for competitive PC gaming.",
            Pc, Gold, None),
        seed("pc-diamond", "PC Optimizations (Diamond)", 1800.0,
            "hGbFbtyN/Loading-Sensi-Pack-Design-PCDiamond-Upscaled.jpg",
            "Optimize your PC to its full potential with advanced settings for peak performance.",
            Pc, Diamond, Some(20)),
        seed("pc-legendary", "PC Settings & Optimizations (Legendary)", 2500.0,
            "FznXdCWR/Loading-Sensi-Pack-Design-PCLegendary-Upscaled.jpg",
            "The ultimate package: custom settings, system optimizations, and expert tips.",
            Pc, Legendary, None),
        seed("ios-silver", "iOS Sensitivity (Silver)", 500.0,
            "d1qbWcg3/Loading-Sensi-Pack-Designios-Silver-Upscaled.jpg",
            "Essential sensitivity settings to get you started with iOS gaming.",
            Ios, Silver, None),
        seed("ios-gold", "iOS Sensitivity (Gold)", 1000.0,
            "h4CB5hDB/Loading-Sensi-Pack-Designios-Gold-Upscaled.jpg",
            "Refined settings for superior aim and control on your iOS device.",
            Ios, Gold, None),
        seed("ios-diamond", "iOS Sensitivity (Diamond)", 1500.0,
            "vZnwTzWY/Loading-Sensi-Pack-Designios-Diamond-Upscaled.jpg",
            "Precision-tuned sensitivity and advanced configuration for elite iOS players.",
            Ios, Diamond, Some(25)),
        seed("ios-legendary", "iOS Sensitivity (Legendary)", 2500.0,
            "TYp6MG1W/Loading-Sensi-Pack-Designios-Legendary-Upscaled.jpg",
            "Custom-built, legendary settings for the highest level of performance on iOS.",
            Ios, Legendary, None),
    ]
}

#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self { products: seed_products() }
    }
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Products ordered by platform, then tier.
    pub fn sorted(&self) -> Vec<Product> {
        let mut out = self.products.clone();
        out.sort_by_key(|p| (p.platform, p.tier));
        out
    }

    pub fn add(&mut self, new: NewProduct) -> SensiResult<Product> {
        if new.name.trim().is_empty() {
            return Err(SensiError::Validation("Product name is required.".to_string()));
        }
        if !new.price.is_finite() || new.price < 0.0 {
            return Err(SensiError::Validation("Price must be a non-negative number.".to_string()));
        }
        let product = Product {
            id: self.next_id(),
            name: new.name,
            price: new.price,
            image_url: new.image_url,
            description: new.description,
            platform: new.platform,
            tier: new.tier,
            discount: new.discount,
        };
        tracing::info!("[SENSI STORE] Product added: {} ({})", product.name, product.id);
        self.products.push(product.clone());
        Ok(product)
    }

    pub fn update(&mut self, id: &str, patch: ProductPatch) -> SensiResult<Product> {
        let product = self
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| SensiError::UnknownProduct(id.to_string()))?;
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(image_url) = patch.image_url {
            product.image_url = image_url;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(platform) = patch.platform {
            product.platform = platform;
        }
        if let Some(tier) = patch.tier {
            product.tier = tier;
        }
        if let Some(discount) = patch.discount {
            product.discount = (discount > 0).then_some(discount);
        }
        tracing::info!("[SENSI STORE] Product updated: {}", id);
        Ok(product.clone())
    }

    pub fn remove(&mut self, id: &str) -> SensiResult<Product> {
        let idx = self
            .products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| SensiError::UnknownProduct(id.to_string()))?;
        tracing::info!("[SENSI STORE] Product deleted: {}", id);
        Ok(self.products.remove(idx))
    }

    /// Epoch millis, bumped past any id already taken.
    fn next_id(&self) -> String {
        let mut millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        while self.get(&millis.to_string()).is_some() {
            millis += 1;
        }
        millis.to_string()
    }
}
