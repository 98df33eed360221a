use crate::*;

/// `Component{i}_fraction`, 1-indexed.
pub fn fraction_column(component: usize) -> String {
    format!("Component{}_fraction", component)
}

/// `Component{i}_Property{j}`, both 1-indexed.
pub fn property_column(component: usize, property: usize) -> String {
    format!("Component{}_Property{}", component, property)
}

/// `Weighted_Avg_Property{j}`, 1-indexed.
pub fn weighted_column(property: usize) -> String {
    format!("Weighted_Avg_Property{}", property)
}

/// The 55 raw feature names in assembly order.
pub fn feature_columns() -> Vec<String> {
    let fractions = (1..=N_COMPONENTS).map(fraction_column);
    let properties = (1..=N_COMPONENTS)
        .flat_map(|i| (1..=N_PROPERTIES).map(move |j| property_column(i, j)));
    fractions.chain(properties).collect()
}

/// The 65 feature names produced by assembly followed by engineering.
pub fn engineered_columns() -> Vec<String> {
    feature_columns()
        .into_iter()
        .chain((1..=N_PROPERTIES).map(weighted_column))
        .collect()
}
