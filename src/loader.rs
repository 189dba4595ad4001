//! Loading product records from CSV.
//!
//! The source columns are mapped onto the ten product fields by a
//! [`ColumnMapping`]; its defaults match the headers of the retail datasets
//! the optimizer was built for.

use crate::error::LoadError;
use crate::problem::ProductParams;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Source header name for each product field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub name: String,
    pub price: String,
    pub production_cost: String,
    pub marketing_cost: String,
    pub logistics_cost: String,
    pub shelf_cost: String,
    pub age: String,
    pub stock: String,
    pub shelf_space: String,
    pub demand: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        ColumnMapping {
            name: "Product ID".into(),
            price: "Price".into(),
            production_cost: "Production_Cost_Per_Unit".into(),
            marketing_cost: "Marketing_Cost_Per_Unit".into(),
            logistics_cost: "Logistics_Cost_Per_Unit".into(),
            shelf_cost: "Shelf_Space_Cost_Per_Unit".into(),
            age: "Age".into(),
            stock: "Remaining_Products".into(),
            shelf_space: "shelf_space".into(),
            demand: "Average_Expected_Demand".into(),
        }
    }
}

impl ColumnMapping {
    /// Field label and source header, in record order (name first).
    fn entries(&self) -> [(&'static str, &str); 10] {
        [
            ("name", self.name.as_str()),
            ("price", self.price.as_str()),
            ("production_cost", self.production_cost.as_str()),
            ("marketing_cost", self.marketing_cost.as_str()),
            ("logistics_cost", self.logistics_cost.as_str()),
            ("shelf_cost", self.shelf_cost.as_str()),
            ("age", self.age.as_str()),
            ("stock", self.stock.as_str()),
            ("shelf_space", self.shelf_space.as_str()),
            ("demand", self.demand.as_str()),
        ]
    }

    pub fn validate(&self) -> Result<(), LoadError> {
        for (field, header) in self.entries() {
            if header.trim().is_empty() {
                return Err(LoadError::EmptyMapping(field));
            }
        }
        Ok(())
    }
}

/// Read product records from any CSV source with a header row.
pub fn load_products<R: Read>(reader: R, mapping: &ColumnMapping) -> Result<Vec<ProductParams>, LoadError> {
    mapping.validate()?;

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let entries = mapping.entries();
    let mut missing = Vec::new();
    let mut positions = [0usize; 10];
    for (slot, (_, header)) in positions.iter_mut().zip(entries.iter()) {
        match headers.iter().position(|h| h == header.trim()) {
            Some(pos) => *slot = pos,
            None => missing.push(header.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing));
    }

    let mut products = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let cell = |k: usize| record.get(positions[k]).unwrap_or("");
        let number = |k: usize| -> Result<f64, LoadError> {
            let raw = cell(k);
            raw.parse::<f64>().map_err(|_| LoadError::InvalidNumber {
                row: row + 1,
                column: entries[k].1.to_string(),
                value: raw.to_string(),
            })
        };

        products.push(ProductParams {
            name: cell(0).to_string(),
            price: number(1)?,
            production_cost: number(2)?,
            marketing_cost: number(3)?,
            logistics_cost: number(4)?,
            shelf_cost: number(5)?,
            age: number(6)?,
            stock: number(7)?,
            shelf_space: number(8)?,
            demand: number(9)?,
        });
    }

    log::info!("Loaded {} product(s)", products.len());
    Ok(products)
}

/// Read product records from a CSV file.
pub fn load_products_from_path<P: AsRef<Path>>(
    path: P,
    mapping: &ColumnMapping,
) -> Result<Vec<ProductParams>, LoadError> {
    let file = File::open(path)?;
    load_products(file, mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Product ID,Price,Production_Cost_Per_Unit,Marketing_Cost_Per_Unit,Logistics_Cost_Per_Unit,Shelf_Space_Cost_Per_Unit,Age,Remaining_Products,shelf_space,Average_Expected_Demand,Category
P-001,12.5,4,1,0.5,0.25,3,10,1.5,120,dairy
P-002, 8 ,2,0.5,0.5,0.1,0,0,1,60,bakery
";

    #[test]
    fn test_load_default_headers() {
        let products = load_products(SAMPLE.as_bytes(), &ColumnMapping::default()).unwrap();
        assert_eq!(products.len(), 2);

        let first = &products[0];
        assert_eq!(first.name, "P-001");
        assert_eq!(first.price, 12.5);
        assert_eq!(first.shelf_cost, 0.25);
        assert_eq!(first.stock, 10.0);
        assert_eq!(first.shelf_space, 1.5);
        assert_eq!(first.demand, 120.0);
        assert_eq!(products[1].price, 8.0);
    }

    #[test]
    fn test_custom_mapping() {
        let data = "sku,p,cp,cm,cl,cs,a,s,sp,d\nX,5,1,1,1,1,2,3,1,9\n";
        let mapping = ColumnMapping {
            name: "sku".into(),
            price: "p".into(),
            production_cost: "cp".into(),
            marketing_cost: "cm".into(),
            logistics_cost: "cl".into(),
            shelf_cost: "cs".into(),
            age: "a".into(),
            stock: "s".into(),
            shelf_space: "sp".into(),
            demand: "d".into(),
        };
        let products = load_products(data.as_bytes(), &mapping).unwrap();
        assert_eq!(products[0].unit_cost(), 4.0);
        assert_eq!(products[0].demand, 9.0);
    }

    #[test]
    fn test_missing_columns_are_listed() {
        let data = "Product ID,Price\nA,1\n";
        match load_products(data.as_bytes(), &ColumnMapping::default()) {
            Err(LoadError::MissingColumns(cols)) => {
                assert_eq!(cols.len(), 8);
                assert!(cols.contains(&"Age".to_string()));
            }
            other => panic!("expected missing columns, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_number_reports_row_and_column() {
        let data = SAMPLE.replace("P-002, 8 ,", "P-002,cheap,");
        match load_products(data.as_bytes(), &ColumnMapping::default()) {
            Err(LoadError::InvalidNumber { row, column, value }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "Price");
                assert_eq!(value, "cheap");
            }
            other => panic!("expected invalid number, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_mapping_rejected() {
        let mapping = ColumnMapping { demand: " ".into(), ..Default::default() };
        assert!(matches!(
            load_products(SAMPLE.as_bytes(), &mapping),
            Err(LoadError::EmptyMapping("demand"))
        ));
    }
}
