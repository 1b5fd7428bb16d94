use crate::error::Result;
use crate::models::{IngredientRequirement, Quantity, Recipe, RecipeId, ShoppingList};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io;

/// 购物清单 CSV 行
#[derive(Debug, Serialize)]
struct ShoppingRow<'a> {
    ingredient: &'a str,
    amount: String,
    unit: &'static str,
    store: &'a str,
}

/// 导出购物清单：ingredient,amount,unit,store；amount 为精确数值
pub fn write_shopping_list<W: io::Write>(list: &ShoppingList, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for entry in &list.entries {
        wtr.serialize(ShoppingRow {
            ingredient: &entry.ingredient,
            amount: entry.quantity.exact_amount(),
            unit: entry.quantity.unit().symbol(),
            store: entry.store.as_deref().unwrap_or(""),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// 菜谱 CSV 行；食材、步骤与附加信息以 JSON 编码存放在单列中
#[derive(Debug, Serialize, Deserialize)]
struct RecipeRow {
    id: String,
    name: String,
    category: String,
    ingredients: String,
    steps: String,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    metadata: String,
}

/// 导出菜谱：id,name,category,ingredients,steps,notes,metadata
pub fn export_recipes<W: io::Write>(recipes: &[Recipe], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for recipe in recipes {
        let ingredients: IndexMap<&str, &Quantity> = recipe
            .ingredients
            .iter()
            .map(|r| (r.ingredient.as_str(), &r.quantity))
            .collect();
        wtr.serialize(RecipeRow {
            id: recipe.id.to_string(),
            name: recipe.name.clone(),
            category: recipe.category.clone().unwrap_or_default(),
            ingredients: serde_json::to_string(&ingredients)?,
            steps: serde_json::to_string(&recipe.steps)?,
            notes: recipe.notes.clone().unwrap_or_default(),
            metadata: serde_json::to_string(&recipe.metadata)?,
        })?;
    }
    wtr.flush()?;
    tracing::info!("导出菜谱 {} 条", recipes.len());
    Ok(())
}

/// 导入菜谱 (格式同 `export_recipes`，notes/metadata 两列可缺省)；不做去重，交给仓库处理
pub fn import_recipes<R: io::Read>(reader: R) -> Result<Vec<Recipe>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut recipes = Vec::new();
    for row in rdr.deserialize::<RecipeRow>() {
        let row = row?;
        let ingredients: IndexMap<String, Quantity> = serde_json::from_str(&row.ingredients)?;
        let steps: Vec<String> = if row.steps.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&row.steps)?
        };
        let metadata: IndexMap<String, String> = if row.metadata.trim().is_empty() {
            IndexMap::new()
        } else {
            serde_json::from_str(&row.metadata)?
        };
        let recipe = Recipe {
            id: RecipeId(row.id),
            name: row.name,
            category: Some(row.category).filter(|c| !c.trim().is_empty()),
            ingredients: ingredients
                .into_iter()
                .map(|(name, quantity)| IngredientRequirement::new(name, quantity))
                .collect(),
            steps,
            notes: Some(row.notes).filter(|n| !n.trim().is_empty()),
            metadata,
        };
        recipe.validate()?;
        recipes.push(recipe);
    }
    Ok(recipes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CookmateError;
    use crate::models::{MissingIngredient, Unit};
    use std::collections::HashMap;

    #[test]
    fn writes_shopping_list_rows() {
        let list = ShoppingList::from_missing(vec![
            MissingIngredient {
                ingredient: "酱油".to_string(),
                missing: Quantity::whole(20, Unit::Milliliter),
            },
            MissingIngredient {
                ingredient: "鸡蛋".to_string(),
                missing: Quantity::whole(3, Unit::Piece),
            },
        ])
        .with_stores(&HashMap::from([("鸡蛋".to_string(), "菜市场".to_string())]));

        let mut out = Vec::new();
        write_shopping_list(&list, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "ingredient,amount,unit,store\n酱油,20,ml,\n鸡蛋,3,pcs,菜市场\n"
        );
    }

    #[test]
    fn recipes_survive_export_and_import() {
        let mut recipe = Recipe::new(
            "tomato-eggs",
            "番茄炒蛋",
            vec![
                IngredientRequirement::new("鸡蛋", Quantity::whole(2, Unit::Piece)),
                IngredientRequirement::new("番茄", "0.15 kg".parse().unwrap()),
            ],
        )
        .with_category("主菜")
        .with_steps(vec!["打蛋".to_string(), "翻炒".to_string()])
        .with_notes("鸡蛋先炒到半熟");
        recipe.set_metadata("难度", "简单");
        recipe.set_metadata("时长", "15 分钟");

        let mut out = Vec::new();
        export_recipes(std::slice::from_ref(&recipe), &mut out).unwrap();
        let imported = import_recipes(out.as_slice()).unwrap();
        assert_eq!(imported, vec![recipe]);
    }

    #[test]
    fn small_amounts_survive_export_and_import() {
        let recipe = Recipe::new(
            "saffron-rice",
            "藏红花饭",
            vec![
                IngredientRequirement::new("藏红花", "0.0004 kg".parse().unwrap()),
                IngredientRequirement::new("米", "0.12345 kg".parse().unwrap()),
            ],
        );

        let mut out = Vec::new();
        export_recipes(std::slice::from_ref(&recipe), &mut out).unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.contains("0.0004 kg"));
        assert!(text.contains("0.12345 kg"));
        assert_eq!(import_recipes(out.as_slice()).unwrap(), vec![recipe]);
    }

    #[test]
    fn import_accepts_rows_without_notes_columns() {
        let csv = "id,name,category,ingredients,steps\nr1,白粥,,\"{\"\"米\"\": \"\"50 g\"\"}\",[]\n";
        let imported = import_recipes(csv.as_bytes()).unwrap();
        assert_eq!(imported[0].notes, None);
        assert!(imported[0].metadata.is_empty());
        assert_eq!(imported[0].ingredients[0].quantity, Quantity::whole(50, Unit::Gram));
    }

    #[test]
    fn import_rejects_unknown_units() {
        let csv = "id,name,category,ingredients,steps\nr1,咸粥,,\"{\"\"盐\"\": \"\"1 pinch\"\"}\",[]\n";
        assert!(matches!(
            import_recipes(csv.as_bytes()),
            Err(CookmateError::Json(_))
        ));
    }
}
