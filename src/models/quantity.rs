use crate::error::PlannerError;
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// 单位换算族：只有同族单位之间可以换算 / 比较 / 加减
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitFamily {
    Mass,
    Volume,
    Count,
    Length,
}

impl UnitFamily {
    /// 族内基准单位
    pub fn base_unit(self) -> Unit {
        match self {
            UnitFamily::Mass => Unit::Gram,
            UnitFamily::Volume => Unit::Milliliter,
            UnitFamily::Count => Unit::Piece,
            UnitFamily::Length => Unit::Millimeter,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UnitFamily::Mass => "mass",
            UnitFamily::Volume => "volume",
            UnitFamily::Count => "count",
            UnitFamily::Length => "length",
        }
    }
}

impl fmt::Display for UnitFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 计量单位 (封闭集合)
///
/// 每个单位带一个到族内基准单位的换算系数，未知单位在加载时即报错。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Unit {
    Milligram,
    Gram,
    Kilogram,
    /// 两 (50 g)
    Liang,
    /// 斤 (500 g)
    Jin,
    Ounce,
    Pound,
    Milliliter,
    Liter,
    Teaspoon,
    Tablespoon,
    Cup,
    /// 个 / 只 / 颗
    Piece,
    Dozen,
    Millimeter,
    Centimeter,
    Meter,
}

impl Unit {
    pub const ALL: [Unit; 17] = [
        Unit::Milligram,
        Unit::Gram,
        Unit::Kilogram,
        Unit::Liang,
        Unit::Jin,
        Unit::Ounce,
        Unit::Pound,
        Unit::Milliliter,
        Unit::Liter,
        Unit::Teaspoon,
        Unit::Tablespoon,
        Unit::Cup,
        Unit::Piece,
        Unit::Dozen,
        Unit::Millimeter,
        Unit::Centimeter,
        Unit::Meter,
    ];

    pub fn family(self) -> UnitFamily {
        match self {
            Unit::Milligram
            | Unit::Gram
            | Unit::Kilogram
            | Unit::Liang
            | Unit::Jin
            | Unit::Ounce
            | Unit::Pound => UnitFamily::Mass,
            Unit::Milliliter | Unit::Liter | Unit::Teaspoon | Unit::Tablespoon | Unit::Cup => {
                UnitFamily::Volume
            }
            Unit::Piece | Unit::Dozen => UnitFamily::Count,
            Unit::Millimeter | Unit::Centimeter | Unit::Meter => UnitFamily::Length,
        }
    }

    /// 展示 / 序列化用的规范符号
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Milligram => "mg",
            Unit::Gram => "g",
            Unit::Kilogram => "kg",
            Unit::Liang => "两",
            Unit::Jin => "斤",
            Unit::Ounce => "oz",
            Unit::Pound => "lb",
            Unit::Milliliter => "ml",
            Unit::Liter => "l",
            Unit::Teaspoon => "tsp",
            Unit::Tablespoon => "tbsp",
            Unit::Cup => "cup",
            Unit::Piece => "pcs",
            Unit::Dozen => "dozen",
            Unit::Millimeter => "mm",
            Unit::Centimeter => "cm",
            Unit::Meter => "m",
        }
    }

    /// 到基准单位的系数，以 (尾数, 小数位) 表示以保持精确
    fn factor_parts(self) -> (i64, u32) {
        match self {
            Unit::Milligram => (1, 3),
            Unit::Gram => (1, 0),
            Unit::Kilogram => (1000, 0),
            Unit::Liang => (50, 0),
            Unit::Jin => (500, 0),
            Unit::Ounce => (28_349_523_125, 9),
            Unit::Pound => (45_359_237, 5),
            Unit::Milliliter => (1, 0),
            Unit::Liter => (1000, 0),
            Unit::Teaspoon => (5, 0),
            Unit::Tablespoon => (15, 0),
            Unit::Cup => (240, 0),
            Unit::Piece => (1, 0),
            Unit::Dozen => (12, 0),
            Unit::Millimeter => (1, 0),
            Unit::Centimeter => (10, 0),
            Unit::Meter => (1000, 0),
        }
    }

    /// 1 个本单位等于多少基准单位
    pub fn base_factor(self) -> BigDecimal {
        let (mantissa, scale) = self.factor_parts();
        let value = BigDecimal::from(mantissa);
        if scale == 0 {
            value
        } else {
            value / BigDecimal::from(10_i64.pow(scale))
        }
    }

    pub fn is_compatible_with(self, other: Unit) -> bool {
        self.family() == other.family()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let unit = match raw.to_ascii_lowercase().as_str() {
            "mg" | "毫克" => Unit::Milligram,
            "g" | "gram" | "grams" | "克" => Unit::Gram,
            "kg" | "kilogram" | "kilograms" | "千克" | "公斤" => Unit::Kilogram,
            "两" => Unit::Liang,
            "斤" => Unit::Jin,
            "oz" | "ounce" | "ounces" => Unit::Ounce,
            "lb" | "lbs" | "pound" | "pounds" => Unit::Pound,
            "ml" | "milliliter" | "milliliters" | "毫升" => Unit::Milliliter,
            "l" | "liter" | "liters" | "升" => Unit::Liter,
            "tsp" | "teaspoon" | "teaspoons" | "茶匙" => Unit::Teaspoon,
            "tbsp" | "tablespoon" | "tablespoons" | "汤匙" => Unit::Tablespoon,
            "cup" | "cups" | "杯" => Unit::Cup,
            "pcs" | "pc" | "piece" | "pieces" | "个" | "只" | "颗" | "片" | "根" => Unit::Piece,
            "dozen" | "打" => Unit::Dozen,
            "mm" | "毫米" => Unit::Millimeter,
            "cm" | "厘米" => Unit::Centimeter,
            "m" | "米" => Unit::Meter,
            _ => return Err(PlannerError::UnknownUnit(raw.to_string())),
        };
        Ok(unit)
    }
}

impl TryFrom<String> for Unit {
    type Error = PlannerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.symbol().to_string()
    }
}

/// 数量值对象：数值 + 单位，不可变
///
/// 数值使用 `BigDecimal`，避免浮点误差；库存与需求场景下数值恒 >= 0。
/// 序列化形式为 `"<数值> <单位>"`，例如 `"200 g"`、`"3 个"`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Quantity {
    amount: BigDecimal,
    unit: Unit,
}

impl Quantity {
    pub fn new(amount: BigDecimal, unit: Unit) -> Result<Self, PlannerError> {
        if amount < BigDecimal::zero() {
            return Err(PlannerError::InvalidQuantity(format!("{} {}", amount, unit)));
        }
        Ok(Self { amount, unit })
    }

    /// 整数用量的便捷构造
    pub fn whole(amount: u64, unit: Unit) -> Self {
        Self {
            amount: BigDecimal::from(amount),
            unit,
        }
    }

    pub fn zero(unit: Unit) -> Self {
        Self {
            amount: BigDecimal::zero(),
            unit,
        }
    }

    pub fn amount(&self) -> &BigDecimal {
        &self.amount
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn family(&self) -> UnitFamily {
        self.unit.family()
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// 单位换算；跨族时返回 `IncompatibleUnit`
    pub fn convert(&self, target: Unit) -> Result<Quantity, PlannerError> {
        if self.unit == target {
            return Ok(self.clone());
        }
        if !self.unit.is_compatible_with(target) {
            return Err(PlannerError::IncompatibleUnit {
                from: self.unit,
                to: target,
            });
        }
        let amount = &self.amount * &self.unit.base_factor() / target.base_factor();
        Ok(Quantity {
            amount,
            unit: target,
        })
    }

    /// 把 `other` 换算到本单位后的数值
    fn aligned_amount(&self, other: &Quantity) -> Result<BigDecimal, PlannerError> {
        Ok(other.convert(self.unit)?.amount)
    }

    /// 加法，结果使用 `self` 的单位
    pub fn try_add(&self, other: &Quantity) -> Result<Quantity, PlannerError> {
        let rhs = self.aligned_amount(other)?;
        Ok(Quantity {
            amount: &self.amount + &rhs,
            unit: self.unit,
        })
    }

    /// 带符号差值 (self - other)，使用 `self` 的单位
    pub fn difference(&self, other: &Quantity) -> Result<BigDecimal, PlannerError> {
        let rhs = self.aligned_amount(other)?;
        Ok(&self.amount - &rhs)
    }

    /// 严格减法：结果为负时返回 `InsufficientQuantity`
    pub fn try_sub(&self, other: &Quantity) -> Result<Quantity, PlannerError> {
        let diff = self.difference(other)?;
        if diff < BigDecimal::zero() {
            return Err(PlannerError::InsufficientQuantity {
                available: self.clone(),
                requested: other.clone(),
            });
        }
        Ok(Quantity {
            amount: diff,
            unit: self.unit,
        })
    }

    /// 截断减法：结果小于零时取零
    pub fn saturating_sub(&self, other: &Quantity) -> Result<Quantity, PlannerError> {
        let diff = self.difference(other)?;
        if diff < BigDecimal::zero() {
            return Ok(Quantity::zero(self.unit));
        }
        Ok(Quantity {
            amount: diff,
            unit: self.unit,
        })
    }

    pub fn compare(&self, other: &Quantity) -> Result<Ordering, PlannerError> {
        let rhs = self.aligned_amount(other)?;
        Ok(self.amount.cmp(&rhs))
    }

    /// 精确数值文本 (只去掉末尾的 0)；序列化与数据交换使用
    pub fn exact_amount(&self) -> String {
        trim_decimal(self.amount.to_string())
    }

    /// 展示用数值：超过 3 位小数时向上取到 3 位，去掉末尾的 0
    ///
    /// 非零数量不会显示为 0。
    pub fn display_amount(&self) -> String {
        let (_, scale) = self.amount.as_bigint_and_exponent();
        if scale <= 3 {
            return self.exact_amount();
        }
        let truncated = self.amount.with_scale(3);
        let amount = if truncated < self.amount {
            truncated + BigDecimal::from(1) / BigDecimal::from(1000)
        } else {
            truncated
        };
        trim_decimal(amount.to_string())
    }

    /// 按倍率缩放，单位不变；倍率由调用方保证为正
    pub fn scale(&self, factor: &BigDecimal) -> Quantity {
        Quantity {
            amount: &self.amount * factor,
            unit: self.unit,
        }
    }
}

/// 去掉小数末尾多余的 0
fn trim_decimal(text: String) -> String {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.display_amount(), self.unit)
    }
}

impl FromStr for Quantity {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let split = text
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(text.len());
        let (number, unit) = text.split_at(split);
        if number.is_empty() {
            return Err(PlannerError::InvalidQuantity(text.to_string()));
        }
        let amount = BigDecimal::from_str(number)
            .map_err(|_| PlannerError::InvalidQuantity(text.to_string()))?;
        let unit: Unit = unit.parse()?;
        Quantity::new(amount, unit)
    }
}

impl TryFrom<String> for Quantity {
    type Error = PlannerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// 序列化文本使用精确数值，不做展示取整
impl From<Quantity> for String {
    fn from(quantity: Quantity) -> Self {
        format!("{} {}", quantity.exact_amount(), quantity.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(text: &str) -> Quantity {
        text.parse().expect("quantity")
    }

    #[test]
    fn parses_symbols_and_aliases() {
        assert_eq!("g".parse::<Unit>().unwrap(), Unit::Gram);
        assert_eq!(" KG ".parse::<Unit>().unwrap(), Unit::Kilogram);
        assert_eq!("公斤".parse::<Unit>().unwrap(), Unit::Kilogram);
        assert_eq!("个".parse::<Unit>().unwrap(), Unit::Piece);
        assert_eq!("毫升".parse::<Unit>().unwrap(), Unit::Milliliter);
        assert!(matches!(
            "handful".parse::<Unit>(),
            Err(PlannerError::UnknownUnit(u)) if u == "handful"
        ));
    }

    #[test]
    fn every_symbol_parses_back() {
        for unit in Unit::ALL {
            assert_eq!(unit.symbol().parse::<Unit>().unwrap(), unit);
        }
    }

    #[test]
    fn parses_quantity_text() {
        let flour = q("200g");
        assert_eq!(flour.unit(), Unit::Gram);
        assert_eq!(flour.amount(), &BigDecimal::from(200));

        let eggs = q("3 个");
        assert_eq!(eggs, Quantity::whole(3, Unit::Piece));

        let milk = q("1.5 l");
        assert_eq!(milk.amount(), &BigDecimal::from_str("1.5").unwrap());

        assert!(matches!("g".parse::<Quantity>(), Err(PlannerError::InvalidQuantity(_))));
        assert!(matches!("-2 g".parse::<Quantity>(), Err(PlannerError::InvalidQuantity(_))));
        assert!(matches!("2 pinch".parse::<Quantity>(), Err(PlannerError::UnknownUnit(_))));
    }

    #[test]
    fn converts_within_family() {
        let half_kilo = q("500 g").convert(Unit::Kilogram).unwrap();
        assert_eq!(half_kilo, q("0.5 kg"));
        assert_eq!(q("1 斤").convert(Unit::Gram).unwrap(), q("500 g"));
        assert_eq!(q("2 tbsp").convert(Unit::Milliliter).unwrap(), q("30 ml"));
        assert_eq!(q("1 dozen").convert(Unit::Piece).unwrap(), q("12 pcs"));
        assert_eq!(q("1 lb").convert(Unit::Gram).unwrap(), q("453.59237 g"));
    }

    #[test]
    fn rejects_cross_family_conversion() {
        let err = q("200 g").convert(Unit::Piece).unwrap_err();
        assert_eq!(
            err,
            PlannerError::IncompatibleUnit {
                from: Unit::Gram,
                to: Unit::Piece
            }
        );
    }

    #[test]
    fn add_uses_left_unit() {
        let total = q("500 g").try_add(&q("0.3 kg")).unwrap();
        assert_eq!(total, q("800 g"));
        assert!(q("1 l").try_add(&q("1 pcs")).is_err());
    }

    #[test]
    fn strict_and_saturating_subtraction() {
        assert_eq!(q("1 kg").try_sub(&q("200 g")).unwrap(), q("0.8 kg"));
        assert!(matches!(
            q("100 g").try_sub(&q("200 g")),
            Err(PlannerError::InsufficientQuantity { .. })
        ));
        assert_eq!(
            q("100 g").saturating_sub(&q("200 g")).unwrap(),
            Quantity::zero(Unit::Gram)
        );
        assert_eq!(
            q("100 g").difference(&q("0.25 kg")).unwrap(),
            BigDecimal::from(-150)
        );
    }

    #[test]
    fn compares_across_units() {
        assert_eq!(q("1 kg").compare(&q("1000 g")).unwrap(), Ordering::Equal);
        assert_eq!(q("1 cup").compare(&q("200 ml")).unwrap(), Ordering::Greater);
        assert_eq!(q("2 cm").compare(&q("1 m")).unwrap(), Ordering::Less);
        assert!(q("1 cm").compare(&q("1 g")).is_err());
    }

    #[test]
    fn display_trims_and_rounds() {
        assert_eq!(q("0.50 kg").to_string(), "0.5 kg");
        assert_eq!(q("200 g").to_string(), "200 g");
        let oz = q("100 g").convert(Unit::Ounce).unwrap();
        assert_eq!(oz.to_string(), "3.528 oz");
        assert_eq!(q("0.0004 kg").to_string(), "0.001 kg");
        assert_eq!(q("1.2345 kg").to_string(), "1.235 kg");
        assert_eq!(q("1.2341 kg").to_string(), "1.235 kg");
        assert_eq!(q("0.0000 kg").to_string(), "0 kg");
    }

    #[test]
    fn serde_uses_text_form() {
        let json = serde_json::to_string(&q("150 g")).unwrap();
        assert_eq!(json, "\"150 g\"");
        let back: Quantity = serde_json::from_str("\"2 个\"").unwrap();
        assert_eq!(back, Quantity::whole(2, Unit::Piece));
        assert!(serde_json::from_str::<Quantity>("\"2 handfuls\"").is_err());
    }

    #[test]
    fn serde_keeps_every_decimal() {
        for text in ["1.2345 kg", "0.0004 kg", "0.000023125 oz", "12.50 ml"] {
            let original = q(text);
            let json = serde_json::to_string(&original).unwrap();
            let back: Quantity = serde_json::from_str(&json).unwrap();
            assert_eq!(back, original, "{text} -> {json}");
        }
        assert_eq!(serde_json::to_string(&q("0.0004 kg")).unwrap(), "\"0.0004 kg\"");

        let oz = q("100 g").convert(Unit::Ounce).unwrap();
        let back: Quantity = String::from(oz.clone()).parse().unwrap();
        assert_eq!(back, oz);
    }
}
