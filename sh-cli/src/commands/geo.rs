//! Geography commands.

use clap::Subcommand;

use sh_core::config::ConfigHandle;
use sh_core::error::ShResult;
use sh_services::SessionContext;

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum GeoAction {
    /// List countries.
    Countries,
    /// List the cities of a country.
    Cities {
        /// ISO country code (defaults to the configured country).
        country: Option<String>,
    },
    /// Show the city pre-selected for a country.
    DefaultCity {
        /// ISO country code (defaults to the configured country).
        country: Option<String>,
    },
    /// Cities within a radius of a city.
    NearbyCities {
        /// Origin city id.
        city_id: String,
        /// Radius in kilometers (defaults to the configured radius).
        #[arg(short, long)]
        radius: Option<f64>,
    },
    /// Providers within a radius of a city.
    NearbyProviders {
        /// Origin city id.
        city_id: String,
        /// Radius in kilometers (defaults to the configured radius).
        #[arg(short, long)]
        radius: Option<f64>,
    },
}

pub async fn run(config: ConfigHandle, action: GeoAction, format: OutputFormat) -> ShResult<()> {
    let registry = super::init_registry(&config, SessionContext::new()).await;
    let geo = registry.geo();

    match action {
        GeoAction::Countries => {
            let countries = geo.countries().await;
            match format {
                OutputFormat::Json => super::print_json(&countries),
                OutputFormat::Text => {
                    let mut table = super::new_table(vec!["Code", "Country"]);
                    for c in &countries {
                        table.add_row(vec![c.code.clone(), c.name.clone()]);
                    }
                    println!("{table}");
                }
            }
        }
        GeoAction::Cities { country } => {
            let code = match country {
                Some(c) => c,
                None => geo.default_country().await,
            };
            let cities = geo.cities_for_country(&code).await;
            match format {
                OutputFormat::Json => super::print_json(&cities),
                OutputFormat::Text => {
                    if cities.is_empty() {
                        println!("No cities known for '{code}'.");
                    } else {
                        let mut table = super::new_table(vec!["Id", "City"]);
                        for c in &cities {
                            table.add_row(vec![c.id.clone(), c.name.clone()]);
                        }
                        println!("{table}");
                        println!("\n{} cities in {}", cities.len(), code.to_ascii_uppercase());
                    }
                }
            }
        }
        GeoAction::DefaultCity { country } => {
            let code = match country {
                Some(c) => c,
                None => geo.default_country().await,
            };
            let city = geo.default_city(&code);
            match format {
                OutputFormat::Json => super::print_json(&city),
                OutputFormat::Text => match city {
                    Some(c) => println!("{} ({})", c.name, c.id),
                    None => println!("No default city for '{code}'."),
                },
            }
        }
        GeoAction::NearbyCities { city_id, radius } => {
            let nearby = geo.cities_within_radius(&city_id, radius).await?;
            match format {
                OutputFormat::Json => super::print_json(&nearby),
                OutputFormat::Text => {
                    if nearby.is_empty() {
                        println!("No cities found.");
                    } else {
                        let mut table = super::new_table(vec!["Id", "City", "Distance"]);
                        for c in &nearby {
                            table.add_row(vec![
                                c.id.clone(),
                                c.name.clone(),
                                format!("{:.1} km", c.distance),
                            ]);
                        }
                        println!("{table}");
                    }
                }
            }
        }
        GeoAction::NearbyProviders { city_id, radius } => {
            let nearby = geo.providers_within_radius(&city_id, radius).await?;
            match format {
                OutputFormat::Json => super::print_json(&nearby),
                OutputFormat::Text => {
                    if nearby.is_empty() {
                        println!("No providers found.");
                    } else {
                        let mut table =
                            super::new_table(vec!["Id", "Business", "Category", "Rating", "Distance"]);
                        for n in &nearby {
                            let p = &n.provider;
                            table.add_row(vec![
                                p.id.clone(),
                                super::truncate(&p.business_name, 30),
                                p.category.clone().unwrap_or_else(|| "-".into()),
                                p.rating.map_or("-".to_string(), |r| format!("{r:.1}")),
                                format!("{:.1} km", n.distance),
                            ]);
                        }
                        println!("{table}");
                    }
                }
            }
        }
    }

    super::print_toasts(&registry.notifications, format);
    Ok(())
}
