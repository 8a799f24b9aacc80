pub mod interface;
pub mod system;

#[cfg(test)]
pub(crate) mod fake;

fn bool_gauge(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}
