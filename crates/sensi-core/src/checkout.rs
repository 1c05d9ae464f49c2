//! Checkout: form validation, order creation and purchased downloads.
//!
//! Payment is simulated. Card and UPI details are checked for presence and
//! then dropped; they never reach the order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::catalog::{Platform, Tier};
use crate::error::{SensiError, SensiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Upi,
    Netbanking,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutForm {
    pub payment_method: PaymentMethod,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
    pub upi_id: String,
}

fn require(value: &str, message: &str) -> SensiResult<()> {
    if value.trim().is_empty() {
        Err(SensiError::Validation(message.to_string()))
    } else {
        Ok(())
    }
}

impl CheckoutForm {
    pub fn validate(&self) -> SensiResult<()> {
        require(&self.email, "Email address is required.")?;
        if !self.email.contains('@') {
            return Err(SensiError::Validation("Enter a valid email address.".to_string()));
        }
        require(&self.first_name, "First name is required.")?;
        require(&self.last_name, "Last name is required.")?;
        match self.payment_method {
            PaymentMethod::Card => {
                require(&self.card_number, "Card number is required.")?;
                require(&self.expiry_date, "Expiry date is required.")?;
                require(&self.cvv, "CVV is required.")?;
            }
            PaymentMethod::Upi => require(&self.upi_id, "UPI ID is required.")?,
            PaymentMethod::Netbanking => {}
        }
        Ok(())
    }
}

/// Installation steps shown next to a purchased pack.
pub fn install_instructions(platform: Platform) -> &'static str {
    match platform {
        Platform::Android => "1. Download the sensitivity file\n2. Open your game settings\n3. Import the sensitivity configuration\n4. Apply and restart your game",
        Platform::Ios => "1. Download the sensitivity profile\n2. Open your game settings\n3. Navigate to Controls > Advanced\n4. Import the sensitivity configuration\n5. Calibrate based on your device model",
        Platform::Pc => "1. Download the complete optimization package\n2. Run the installer as administrator\n3. Follow the setup wizard\n4. Restart your PC for optimal performance",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasedItem {
    pub id: String,
    pub name: String,
    pub platform: Platform,
    pub tier: Tier,
    pub download_url: String,
    pub instructions: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub email: String,
    pub customer_name: String,
    pub payment_method: PaymentMethod,
    pub items: Vec<PurchasedItem>,
    pub total: f64,
    pub placed_at: DateTime<Utc>,
}

/// Validate and turn the cart into an order. The cart itself is left untouched.
pub fn place_order(cart: &Cart, form: &CheckoutForm) -> SensiResult<Order> {
    if cart.is_empty() {
        return Err(SensiError::Validation("Your cart is empty.".to_string()));
    }
    form.validate()?;

    let items = cart
        .items()
        .map(|item| PurchasedItem {
            id: item.product.id.clone(),
            name: item.product.name.clone(),
            platform: item.product.platform,
            tier: item.product.tier,
            download_url: format!("/downloads/{}", item.product.id),
            instructions: install_instructions(item.product.platform).to_string(),
        })
        .collect();
    let order = Order {
        order_id: uuid::Uuid::new_v4().to_string(),
        email: form.email.trim().to_string(),
        customer_name: format!("{} {}", form.first_name.trim(), form.last_name.trim()),
        payment_method: form.payment_method,
        items,
        total: cart.total(),
        placed_at: Utc::now(),
    };
    tracing::info!(
        "[SENSI STORE] Order {} placed: {} item(s), total {:.2} via {:?}",
        order.order_id,
        order.items.len(),
        order.total,
        order.payment_method
    );
    Ok(order)
}

/// Legendary access unlocks the support chatbot.
pub fn has_legendary_access(purchases: &[PurchasedItem]) -> bool {
    purchases.iter().any(|p| p.tier == Tier::Legendary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn form() -> CheckoutForm {
        CheckoutForm {
            payment_method: PaymentMethod::Card,
            email: "player@example.com".into(),
            first_name: "Ravi".into(),
            last_name: "K".into(),
            card_number: "4111111111111111".into(),
            expiry_date: "12/29".into(),
            cvv: "123".into(),
            upi_id: String::new(),
        }
    }

    #[test]
    fn empty_cart_is_rejected() {
        let cart = Cart::default();
        assert!(matches!(place_order(&cart, &form()), Err(SensiError::Validation(_))));
    }

    #[test]
    fn payment_method_fields_are_required() {
        let mut f = form();
        f.cvv.clear();
        assert!(f.validate().is_err());

        f.payment_method = PaymentMethod::Upi;
        assert!(f.validate().is_err());
        f.upi_id = "player@upi".into();
        assert!(f.validate().is_ok());

        f.payment_method = PaymentMethod::Netbanking;
        f.upi_id.clear();
        assert!(f.validate().is_ok());

        f.last_name = " ".into();
        assert!(f.validate().is_err());
    }

    #[test]
    fn order_carries_instructions_and_keeps_cart() {
        let catalog = Catalog::default();
        let mut cart = Cart::default();
        cart.add(catalog.get("pc-legendary").unwrap());
        cart.add(catalog.get("android-gold").unwrap());

        let mut f = form();
        f.payment_method = PaymentMethod::Netbanking;
        let order = place_order(&cart, &f).unwrap();
        assert_eq!(order.total, 3300.0);
        assert_eq!(order.customer_name, "Ravi K");
        assert_eq!(cart.items().count(), 2);
        assert_eq!(cart.total(), 3300.0);

        let pc = order.items.iter().find(|i| i.id == "pc-legendary").unwrap();
        assert!(pc.instructions.contains("Run the installer as administrator"));
        assert!(has_legendary_access(&order.items));
        assert!(!has_legendary_access(&order.items[..0]));
    }

    #[test]
    fn card_details_are_not_serialized() {
        let catalog = Catalog::default();
        let mut cart = Cart::default();
        cart.add(catalog.get("ios-silver").unwrap());
        let order = place_order(&cart, &form()).unwrap();
        let json = serde_json::to_string(&order).unwrap();
        assert!(!json.contains("4111111111111111"));
        assert!(!json.contains("cvv"));
    }
}
