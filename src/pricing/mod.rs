//! Price and inventory derivation for the product form.
//!
//! Keeps five pricing quantities mutually consistent (cost price, base
//! price, current sale price, profit percentage, discount percentage),
//! recomputing the others from whichever price the user edited last, and
//! derives the total stock quantity from the available and reserved counts.
//!
//! The invariant family:
//!
//! ```text
//! base_price    == round(cost_price * (1 + profit_percentage / 100))
//! current_price == round(base_price * (1 - discount_percentage / 100))
//! profit_percentage   >= MIN_PROFIT_PERCENTAGE
//! discount_percentage <= MAX_DISCOUNT_PERCENTAGE
//! current_price <= base_price
//! ```
//!
//! Every derivation ends in [`validate_prices`], a terminal clamp pass that
//! never re-enters edit dispatch. The engine performs no I/O; violations are
//! returned as data and turned into user notices by
//! [`crate::notifications`].
//!
//! Prices are whole currency units and percentages whole percents, both kept
//! as [`Decimal`]. Rounding is round-half-up (`MidpointAwayFromZero`); the
//! current-price floor raise rounds up to the next whole unit.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Lowest profit margin a base price may encode, in percent.
pub const MIN_PROFIT_PERCENTAGE: Decimal = dec!(20);

/// Highest discount a current price may encode, in percent.
pub const MAX_DISCOUNT_PERCENTAGE: Decimal = dec!(99);

const ONE_HUNDRED: Decimal = dec!(100);
const ONE_THOUSAND: Decimal = dec!(1000);

/// The five mutually consistent pricing quantities of one product form.
///
/// The percentage fields are derived and read-only to the user; they are
/// only ever written by the functions in this module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingFields {
    #[serde(default)]
    pub cost_price: Decimal,
    #[serde(default)]
    pub base_price: Decimal,
    #[serde(default)]
    pub current_price: Decimal,
    #[serde(default)]
    pub profit_percentage: Decimal,
    #[serde(default)]
    pub discount_percentage: Decimal,
}

/// Stock counts of one product form. `total_quantity` is strictly derived
/// and cannot be set independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "InventoryWire")]
pub struct InventoryFields {
    available_quantity: i32,
    reserved_quantity: i32,
    total_quantity: i32,
}

/// Wire shape for [`InventoryFields`]: the total is recomputed on
/// deserialization, never trusted.
#[derive(Deserialize)]
struct InventoryWire {
    #[serde(default)]
    available_quantity: i32,
    #[serde(default)]
    reserved_quantity: i32,
}

impl From<InventoryWire> for InventoryFields {
    fn from(wire: InventoryWire) -> Self {
        InventoryFields::new(wire.available_quantity, wire.reserved_quantity)
    }
}

impl InventoryFields {
    pub fn new(available: i32, reserved: i32) -> Self {
        let available_quantity = available.max(0);
        let reserved_quantity = reserved.max(0);
        Self {
            available_quantity,
            reserved_quantity,
            total_quantity: available_quantity + reserved_quantity,
        }
    }

    pub fn available_quantity(&self) -> i32 {
        self.available_quantity
    }

    pub fn reserved_quantity(&self) -> i32 {
        self.reserved_quantity
    }

    pub fn total_quantity(&self) -> i32 {
        self.total_quantity
    }
}

/// Which price field the user edited, with the entered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceEdit {
    Cost(Decimal),
    Base(Decimal),
    Current(Decimal),
}

/// Which quantity field the user edited, with the entered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityEdit {
    Available(i32),
    Reserved(i32),
}

/// One of the three editable price fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Cost,
    Base,
    Current,
}

/// One business-rule correction applied during derivation.
///
/// Variants carry the corrected values so the notification layer can render
/// a concrete message without recomputing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Violation {
    /// A base price was entered before any cost price.
    CostPriceRequired,
    /// A current price was entered before any base price.
    BasePriceRequired,
    /// The entered base price encoded less than the minimum profit margin.
    ProfitBelowMinimum { corrected_base_price: Decimal },
    /// The current price fell below the minimum-margin floor.
    CurrentPriceBelowFloor { floor: Decimal },
    /// The current price exceeded the base price.
    CurrentPriceAboveBase { base_price: Decimal },
    /// The discount exceeded the maximum percentage.
    DiscountAboveMaximum { corrected_current_price: Decimal },
}

fn round_unit(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn ceil_unit(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::ToPositiveInfinity)
}

fn base_from_cost(cost_price: Decimal, profit_percentage: Decimal) -> Decimal {
    round_unit(cost_price * (ONE_HUNDRED + profit_percentage) / ONE_HUNDRED)
}

fn current_from_base(base_price: Decimal, discount_percentage: Decimal) -> Decimal {
    round_unit(base_price * (ONE_HUNDRED - discount_percentage) / ONE_HUNDRED)
}

/// Caller guarantees `cost_price > 0`.
fn profit_from_prices(cost_price: Decimal, base_price: Decimal) -> Decimal {
    round_unit((base_price - cost_price) / cost_price * ONE_HUNDRED)
}

/// Caller guarantees `base_price > 0`. Never negative.
fn discount_from_prices(base_price: Decimal, current_price: Decimal) -> Decimal {
    round_unit((base_price - current_price) / base_price * ONE_HUNDRED).max(Decimal::ZERO)
}

/// Lowest current price allowed for a given cost price, rounded up to a
/// whole unit: the sale price can never erase the minimum margin.
fn min_current_price(cost_price: Decimal) -> Decimal {
    ceil_unit(cost_price * (ONE_HUNDRED + MIN_PROFIT_PERCENTAGE) / ONE_HUNDRED)
}

/// Snaps a value to the nearest thousand.
pub fn round_to_thousand(value: Decimal) -> Decimal {
    round_unit(value / ONE_THOUSAND) * ONE_THOUSAND
}

/// User-invocable per-field "round" action: snaps the field to the nearest
/// thousand and rederives the rest through the normal edit path.
pub fn round_price_field(
    fields: PricingFields,
    field: PriceField,
) -> (PricingFields, Vec<Violation>) {
    let edit = match field {
        PriceField::Cost => PriceEdit::Cost(round_to_thousand(fields.cost_price)),
        PriceField::Base => PriceEdit::Base(round_to_thousand(fields.base_price)),
        PriceField::Current => PriceEdit::Current(round_to_thousand(fields.current_price)),
    };
    apply_price_edit(fields, edit)
}

/// Applies one price edit and rederives the dependent fields.
///
/// A non-positive entered value is a no-op. Violations are returned in the
/// order the corrections were applied.
pub fn apply_price_edit(fields: PricingFields, edit: PriceEdit) -> (PricingFields, Vec<Violation>) {
    match edit {
        PriceEdit::Cost(value) => edit_cost_price(fields, value),
        PriceEdit::Base(value) => edit_base_price(fields, value),
        PriceEdit::Current(value) => edit_current_price(fields, value),
    }
}

/// Applies one quantity edit and rederives the total. Negative input is a
/// no-op; the other quantity field is left untouched.
pub fn apply_quantity_edit(inventory: InventoryFields, edit: QuantityEdit) -> InventoryFields {
    let mut next = inventory;
    match edit {
        QuantityEdit::Available(value) if value >= 0 => next.available_quantity = value,
        QuantityEdit::Reserved(value) if value >= 0 => next.reserved_quantity = value,
        _ => return inventory,
    }
    next.total_quantity = next.available_quantity + next.reserved_quantity;
    next
}

fn edit_cost_price(mut fields: PricingFields, value: Decimal) -> (PricingFields, Vec<Violation>) {
    if value <= Decimal::ZERO {
        return (fields, Vec::new());
    }
    fields.cost_price = value;
    fields.profit_percentage = fields.profit_percentage.max(MIN_PROFIT_PERCENTAGE);
    fields.base_price = base_from_cost(fields.cost_price, fields.profit_percentage);
    derive_current_side(&mut fields);
    validate_prices(fields)
}

fn edit_base_price(mut fields: PricingFields, value: Decimal) -> (PricingFields, Vec<Violation>) {
    if value <= Decimal::ZERO {
        return (fields, Vec::new());
    }
    if fields.cost_price <= Decimal::ZERO {
        return (fields, vec![Violation::CostPriceRequired]);
    }

    let mut violations = Vec::new();
    fields.base_price = value;
    fields.profit_percentage = profit_from_prices(fields.cost_price, value);
    if fields.profit_percentage < MIN_PROFIT_PERCENTAGE {
        fields.profit_percentage = MIN_PROFIT_PERCENTAGE;
        fields.base_price = base_from_cost(fields.cost_price, MIN_PROFIT_PERCENTAGE);
        violations.push(Violation::ProfitBelowMinimum {
            corrected_base_price: fields.base_price,
        });
    }
    derive_current_side(&mut fields);

    let (fields, more) = validate_prices(fields);
    violations.extend(more);
    (fields, violations)
}

fn edit_current_price(mut fields: PricingFields, value: Decimal) -> (PricingFields, Vec<Violation>) {
    if value <= Decimal::ZERO {
        return (fields, Vec::new());
    }
    if fields.base_price <= Decimal::ZERO {
        return (fields, vec![Violation::BasePriceRequired]);
    }

    let mut violations = Vec::new();
    let mut entered = value;

    if fields.cost_price > Decimal::ZERO {
        let floor = min_current_price(fields.cost_price);
        if entered < floor {
            entered = floor;
            violations.push(Violation::CurrentPriceBelowFloor { floor });
        }
    }
    if entered > fields.base_price {
        entered = fields.base_price;
        violations.push(Violation::CurrentPriceAboveBase {
            base_price: fields.base_price,
        });
    }

    fields.current_price = entered;
    fields.discount_percentage = discount_from_prices(fields.base_price, entered);

    let (fields, more) = validate_prices(fields);
    violations.extend(more);
    (fields, violations)
}

/// Rederives the current-price side after the cost or base price moved.
///
/// An already entered current price is kept and the discount recomputed
/// around it; otherwise the current price is derived from the (capped)
/// stored discount.
fn derive_current_side(fields: &mut PricingFields) {
    if fields.current_price > Decimal::ZERO {
        fields.discount_percentage =
            discount_from_prices(fields.base_price, fields.current_price);
    } else {
        fields.discount_percentage = fields.discount_percentage.min(MAX_DISCOUNT_PERCENTAGE);
        fields.current_price = current_from_base(fields.base_price, fields.discount_percentage);
    }
}

/// Terminal clamp pass run after every derivation.
///
/// All four checks run every pass, in this fixed order, so one edit can
/// stack several corrections. This function never re-enters edit dispatch.
pub fn validate_prices(mut fields: PricingFields) -> (PricingFields, Vec<Violation>) {
    let mut violations = Vec::new();

    if fields.cost_price > Decimal::ZERO
        && profit_from_prices(fields.cost_price, fields.base_price) < MIN_PROFIT_PERCENTAGE
    {
        fields.profit_percentage = MIN_PROFIT_PERCENTAGE;
        fields.base_price = base_from_cost(fields.cost_price, MIN_PROFIT_PERCENTAGE);
        if fields.current_price > Decimal::ZERO {
            fields.discount_percentage =
                discount_from_prices(fields.base_price, fields.current_price);
        }
        violations.push(Violation::ProfitBelowMinimum {
            corrected_base_price: fields.base_price,
        });
    }

    if fields.cost_price > Decimal::ZERO && fields.current_price > Decimal::ZERO {
        let floor = min_current_price(fields.cost_price);
        if fields.current_price < floor {
            fields.current_price = floor;
            if fields.base_price > Decimal::ZERO {
                fields.discount_percentage = discount_from_prices(fields.base_price, floor);
            }
            violations.push(Violation::CurrentPriceBelowFloor { floor });
        }
    }

    if fields.current_price > fields.base_price {
        fields.current_price = fields.base_price;
        fields.discount_percentage = Decimal::ZERO;
        violations.push(Violation::CurrentPriceAboveBase {
            base_price: fields.base_price,
        });
    }

    if fields.discount_percentage > MAX_DISCOUNT_PERCENTAGE {
        fields.discount_percentage = MAX_DISCOUNT_PERCENTAGE;
        fields.current_price = current_from_base(fields.base_price, MAX_DISCOUNT_PERCENTAGE);
        violations.push(Violation::DiscountAboveMaximum {
            corrected_current_price: fields.current_price,
        });
    }

    (fields, violations)
}
