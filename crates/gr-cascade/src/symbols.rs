//! Symbol definitions and the validated symbol table

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Character family a symbol belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Character {
    Coolcat,
    Shiba,
    Tabby,
    Trump,
    Pepefrog,
    Pepe,
}

/// Rarity tier, ordered from most to least frequent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common = 0,
    Uncommon = 1,
    Rare = 2,
    Epic = 3,
    Legendary = 4,
}

/// Special role of a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialRole {
    /// Regular paying symbol
    #[default]
    None,
    /// Substitutes for any non-bonus symbol
    Wild,
    /// Triggers the sticky-wild bonus round
    Bonus,
    /// Pays normally and can award the grand win
    Jackpot,
}

/// A symbol definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// Unique symbol ID
    pub id: u32,
    /// Asset name (e.g. "coolcat_cart")
    pub name: String,
    pub character: Character,
    pub rarity: Rarity,
    /// Draw weight in the base game
    pub weight: u32,
    /// Draw weight inside the bonus round (0 = never drawn there)
    #[serde(default)]
    pub bonus_weight: u32,
    /// Base point value of a match
    pub base_points: u32,
    #[serde(default)]
    pub role: SpecialRole,
}

impl Symbol {
    /// Create a regular symbol
    pub fn regular(
        id: u32,
        name: impl Into<String>,
        character: Character,
        rarity: Rarity,
        weight: u32,
        base_points: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            character,
            rarity,
            weight,
            bonus_weight: weight,
            base_points,
            role: SpecialRole::None,
        }
    }

    /// Create a wild symbol
    pub fn wild(id: u32, name: impl Into<String>, character: Character, weight: u32) -> Self {
        Self {
            id,
            name: name.into(),
            character,
            rarity: Rarity::Legendary,
            weight,
            bonus_weight: weight,
            base_points: 0,
            role: SpecialRole::Wild,
        }
    }

    /// Create a bonus symbol (never drawn inside the bonus round by default)
    pub fn bonus(id: u32, name: impl Into<String>, character: Character, weight: u32) -> Self {
        Self {
            id,
            name: name.into(),
            character,
            rarity: Rarity::Legendary,
            weight,
            bonus_weight: 0,
            base_points: 0,
            role: SpecialRole::Bonus,
        }
    }

    /// Create a jackpot symbol
    pub fn jackpot(
        id: u32,
        name: impl Into<String>,
        character: Character,
        weight: u32,
        base_points: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            character,
            rarity: Rarity::Legendary,
            weight,
            bonus_weight: weight,
            base_points,
            role: SpecialRole::Jackpot,
        }
    }

    /// Builder: override the bonus-round weight
    pub fn with_bonus_weight(mut self, weight: u32) -> Self {
        self.bonus_weight = weight;
        self
    }

    pub fn is_wild(&self) -> bool {
        self.role == SpecialRole::Wild
    }

    pub fn is_bonus(&self) -> bool {
        self.role == SpecialRole::Bonus
    }

    /// Check if this is a special symbol (wild, bonus, jackpot)
    pub fn is_special(&self) -> bool {
        self.role != SpecialRole::None
    }
}

/// Immutable, validated symbol table
///
/// Symbols keep their configured order, which is the walk order of the
/// weighted selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Symbol>", into = "Vec<Symbol>")]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    index: HashMap<u32, usize>,
    wild_id: Option<u32>,
    bonus_id: Option<u32>,
    jackpot_id: Option<u32>,
}

impl SymbolTable {
    /// Validate and build a table
    pub fn new(symbols: Vec<Symbol>) -> Result<Self, ConfigError> {
        if symbols.is_empty() {
            return Err(ConfigError::EmptySymbolTable);
        }

        let mut index = HashMap::with_capacity(symbols.len());
        let mut wild_id = None;
        let mut bonus_id = None;
        let mut jackpot_id = None;

        for (i, symbol) in symbols.iter().enumerate() {
            if index.insert(symbol.id, i).is_some() {
                return Err(ConfigError::DuplicateSymbol(symbol.id));
            }
            if symbol.weight == 0 {
                return Err(ConfigError::ZeroWeight(symbol.id));
            }
            let slot = match symbol.role {
                SpecialRole::Wild => Some((&mut wild_id, "wild")),
                SpecialRole::Bonus => Some((&mut bonus_id, "bonus")),
                SpecialRole::Jackpot => Some((&mut jackpot_id, "jackpot")),
                SpecialRole::None => None,
            };
            if let Some((slot, role)) = slot {
                if slot.replace(symbol.id).is_some() {
                    return Err(ConfigError::DuplicateRole(role));
                }
            }
        }

        let regular = symbols
            .iter()
            .filter(|s| s.role == SpecialRole::None)
            .count();
        if regular < 2 {
            return Err(ConfigError::TooFewRegularSymbols(regular));
        }

        Ok(Self {
            symbols,
            index,
            wild_id,
            bonus_id,
            jackpot_id,
        })
    }

    /// The production Grocery Run table (23 symbols)
    pub fn grocery_run() -> Self {
        use Character::*;
        use Rarity::*;

        let symbols = vec![
            // Common: characters with cart
            Symbol::regular(0, "coolcat_cart", Coolcat, Common, 80, 10).with_bonus_weight(90),
            Symbol::regular(1, "shiba_cart", Shiba, Common, 80, 10).with_bonus_weight(90),
            Symbol::regular(2, "tabby_cart", Tabby, Common, 75, 10).with_bonus_weight(85),
            Symbol::regular(3, "trump_cart", Trump, Common, 70, 15).with_bonus_weight(80),
            Symbol::regular(4, "pepefrog_cart", Pepefrog, Common, 65, 15).with_bonus_weight(75),
            // Uncommon: characters with steak
            Symbol::regular(5, "coolcat_steak", Coolcat, Uncommon, 55, 25).with_bonus_weight(65),
            Symbol::regular(6, "shiba_steak", Shiba, Uncommon, 50, 25).with_bonus_weight(60),
            Symbol::regular(7, "tabby_steak", Tabby, Uncommon, 50, 25).with_bonus_weight(60),
            Symbol::regular(8, "trump_steak", Trump, Uncommon, 45, 30).with_bonus_weight(55),
            Symbol::regular(9, "pepefrog_steak", Pepefrog, Uncommon, 40, 30).with_bonus_weight(50),
            // Rare: characters with stonks
            Symbol::regular(10, "coolcat_stonks", Coolcat, Rare, 35, 50).with_bonus_weight(45),
            Symbol::regular(11, "shiba_stonks", Shiba, Rare, 30, 50).with_bonus_weight(40),
            Symbol::regular(12, "tabby_stonks", Tabby, Rare, 30, 50).with_bonus_weight(40),
            Symbol::regular(13, "trump_stonks", Trump, Rare, 25, 75).with_bonus_weight(35),
            Symbol::regular(14, "pepefrog_stonks", Pepefrog, Rare, 25, 75).with_bonus_weight(35),
            // Epic pepes
            Symbol::regular(15, "pepe_king", Pepe, Epic, 18, 100).with_bonus_weight(28),
            Symbol::regular(16, "pepe_stonks", Pepe, Epic, 15, 125).with_bonus_weight(25),
            Symbol::regular(17, "pepe_money", Pepe, Epic, 12, 150).with_bonus_weight(22),
            Symbol::regular(18, "pepe_rich", Pepe, Epic, 10, 175).with_bonus_weight(20),
            // Legendary
            Symbol::regular(19, "pepe_feelsgood", Pepe, Legendary, 8, 250).with_bonus_weight(18),
            Symbol::jackpot(20, "pepe_bitcoin", Pepe, 5, 500).with_bonus_weight(10),
            Symbol::wild(21, "pepe_diamond", Pepe, 4).with_bonus_weight(30),
            Symbol::bonus(22, "pepe_maga", Pepe, 30),
        ];

        // The literal table above is valid by construction.
        match Self::new(symbols) {
            Ok(table) => table,
            Err(e) => unreachable!("built-in symbol table rejected: {e}"),
        }
    }

    /// Get symbol by ID
    pub fn get(&self, id: u32) -> Option<&Symbol> {
        self.index.get(&id).map(|&i| &self.symbols[i])
    }

    pub fn contains(&self, id: u32) -> bool {
        self.index.contains_key(&id)
    }

    /// All symbols in table order
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn wild_id(&self) -> Option<u32> {
        self.wild_id
    }

    pub fn bonus_id(&self) -> Option<u32> {
        self.bonus_id
    }

    pub fn jackpot_id(&self) -> Option<u32> {
        self.jackpot_id
    }

    pub fn is_wild(&self, id: u32) -> bool {
        self.wild_id == Some(id)
    }

    pub fn is_bonus(&self, id: u32) -> bool {
        self.bonus_id == Some(id)
    }

    /// (id, weight) pairs for base-game draws
    pub fn base_weights(&self) -> Vec<(u32, u32)> {
        self.symbols.iter().map(|s| (s.id, s.weight)).collect()
    }

    /// (id, weight) pairs for bonus-round draws
    pub fn bonus_weights(&self) -> Vec<(u32, u32)> {
        self.symbols.iter().map(|s| (s.id, s.bonus_weight)).collect()
    }

    /// Symbol IDs that can anchor a cluster, in ascending order
    ///
    /// Every symbol except the wild: the wild only joins clusters anchored by
    /// another symbol, or forms a wild sweep on its own.
    pub fn cluster_targets(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .symbols
            .iter()
            .filter(|s| !s.is_wild())
            .map(|s| s.id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::grocery_run()
    }
}

impl TryFrom<Vec<Symbol>> for SymbolTable {
    type Error = ConfigError;

    fn try_from(symbols: Vec<Symbol>) -> Result<Self, Self::Error> {
        Self::new(symbols)
    }
}

impl From<SymbolTable> for Vec<Symbol> {
    fn from(table: SymbolTable) -> Self {
        table.symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_regulars() -> Vec<Symbol> {
        vec![
            Symbol::regular(0, "a", Character::Coolcat, Rarity::Common, 1, 10),
            Symbol::regular(1, "b", Character::Shiba, Rarity::Common, 3, 10),
        ]
    }

    #[test]
    fn test_grocery_run_table() {
        let table = SymbolTable::grocery_run();
        assert_eq!(table.len(), 23);
        assert_eq!(table.wild_id(), Some(21));
        assert_eq!(table.bonus_id(), Some(22));
        assert_eq!(table.jackpot_id(), Some(20));
        assert_eq!(table.get(15).map(|s| s.name.as_str()), Some("pepe_king"));
        assert!(!table.cluster_targets().contains(&21));
    }

    #[test]
    fn test_empty_table_rejected() {
        assert_eq!(SymbolTable::new(Vec::new()), Err(ConfigError::EmptySymbolTable));
    }

    #[test]
    fn test_duplicate_and_zero_weight_rejected() {
        let mut symbols = two_regulars();
        symbols.push(Symbol::regular(1, "dup", Character::Tabby, Rarity::Rare, 2, 5));
        assert_eq!(SymbolTable::new(symbols), Err(ConfigError::DuplicateSymbol(1)));

        let mut symbols = two_regulars();
        symbols[0].weight = 0;
        assert_eq!(SymbolTable::new(symbols), Err(ConfigError::ZeroWeight(0)));
    }

    #[test]
    fn test_role_rules() {
        let mut symbols = two_regulars();
        symbols.push(Symbol::wild(7, "w1", Character::Pepe, 1));
        symbols.push(Symbol::wild(8, "w2", Character::Pepe, 1));
        assert_eq!(SymbolTable::new(symbols), Err(ConfigError::DuplicateRole("wild")));

        let symbols = vec![
            Symbol::regular(0, "a", Character::Coolcat, Rarity::Common, 1, 10),
            Symbol::wild(1, "w", Character::Pepe, 1),
        ];
        assert_eq!(
            SymbolTable::new(symbols),
            Err(ConfigError::TooFewRegularSymbols(1))
        );
    }

    #[test]
    fn test_rarity_ordering() {
        assert!(Rarity::Common < Rarity::Uncommon);
        assert!(Rarity::Epic < Rarity::Legendary);
    }

    #[test]
    fn test_table_serde_revalidates() {
        let table = SymbolTable::new(two_regulars()).unwrap();
        let json = serde_json::to_string(&table).unwrap();
        let back: SymbolTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(1).map(|s| s.weight), Some(3));

        let bad = r#"[{"id":0,"name":"a","character":"coolcat","rarity":"common","weight":1,"base_points":1}]"#;
        assert!(serde_json::from_str::<SymbolTable>(bad).is_err());
    }
}
