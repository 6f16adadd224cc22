//! Provider commands.

use clap::Subcommand;
use console::style;

use sh_core::config::ConfigHandle;
use sh_core::error::ShResult;
use sh_services::{ProviderFilter, SessionContext};

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ProvidersAction {
    /// Search providers.
    Search {
        /// ISO country code.
        #[arg(long)]
        country: Option<String>,
        /// City id. With --radius, searches around this city.
        #[arg(long)]
        city: Option<String>,
        /// Radius in kilometers around --city.
        #[arg(short, long, requires = "city")]
        radius: Option<f64>,
        /// Category (case-insensitive).
        #[arg(long)]
        category: Option<String>,
        /// Minimum rating.
        #[arg(long)]
        min_rating: Option<f64>,
        /// Only providers taking bookings.
        #[arg(long)]
        available: bool,
        /// Maximum number of results.
        #[arg(short = 'n', long)]
        limit: Option<u64>,
    },
    /// Show one provider.
    Show {
        /// Provider id.
        id: String,
    },
    /// List a provider's active services.
    Services {
        /// Provider id.
        id: String,
    },
}

pub async fn run(config: ConfigHandle, action: ProvidersAction, format: OutputFormat) -> ShResult<()> {
    let registry = super::init_registry(&config, SessionContext::new()).await;
    let providers = registry.providers();
    let currency = config.read().await.wallet.currency.clone();

    match action {
        ProvidersAction::Search {
            country,
            city,
            radius,
            category,
            min_rating,
            available,
            limit,
        } => {
            let filter = ProviderFilter {
                country_code: country,
                city_id: city,
                radius_km: radius,
                category,
                min_rating,
                available_only: available,
                limit,
            };
            let hits = providers.search(&filter).await?;

            match format {
                OutputFormat::Json => super::print_json(&hits),
                OutputFormat::Text => {
                    if hits.is_empty() {
                        println!("No providers found.");
                    } else {
                        let mut table = super::new_table(vec![
                            "Id", "Business", "Category", "Rating", "Rate/h", "Distance",
                        ]);
                        for hit in &hits {
                            let p = &hit.provider;
                            let name = if p.is_available {
                                super::truncate(&p.business_name, 30)
                            } else {
                                format!("{} (busy)", super::truncate(&p.business_name, 23))
                            };
                            table.add_row(vec![
                                p.id.clone(),
                                name,
                                p.category.clone().unwrap_or_else(|| "-".into()),
                                p.rating.map_or("-".to_string(), |r| {
                                    format!("{r:.1} ({})", p.review_count)
                                }),
                                p.hourly_rate.map_or("-".to_string(), |r| {
                                    super::format_amount(r.round() as i64, &currency)
                                }),
                                hit.distance_km.map_or("-".to_string(), |d| format!("{d:.1} km")),
                            ]);
                        }
                        println!("{table}");
                        println!("\n{} providers", hits.len());
                    }
                }
            }
        }
        ProvidersAction::Show { id } => {
            let p = providers.get(&id).await?;
            match format {
                OutputFormat::Json => super::print_json(&p),
                OutputFormat::Text => {
                    println!("{}", style(&p.business_name).bold().underlined());
                    println!("  Id:          {}", p.id);
                    println!("  Category:    {}", p.category.as_deref().unwrap_or("-"));
                    println!(
                        "  Location:    {} / city {}",
                        p.country_code.as_deref().unwrap_or("-"),
                        p.city_id.as_deref().unwrap_or("-")
                    );
                    println!(
                        "  Rating:      {} ({} reviews)",
                        p.rating.map_or("-".to_string(), |r| format!("{r:.1}")),
                        p.review_count
                    );
                    if let Some(rate) = p.hourly_rate {
                        println!(
                            "  Hourly rate: {}",
                            super::format_amount(rate.round() as i64, &currency)
                        );
                    }
                    println!(
                        "  Available:   {}",
                        if p.is_available {
                            style("yes").green().to_string()
                        } else {
                            style("no").yellow().to_string()
                        }
                    );
                    if let Some(description) = &p.description {
                        println!("\n  {description}");
                    }
                }
            }
        }
        ProvidersAction::Services { id } => {
            let services = providers.services(&id).await?;
            match format {
                OutputFormat::Json => super::print_json(&services),
                OutputFormat::Text => {
                    if services.is_empty() {
                        println!("No active services.");
                    } else {
                        let mut table = super::new_table(vec!["Id", "Service", "Price", "Duration"]);
                        for s in &services {
                            table.add_row(vec![
                                s.id.clone(),
                                super::truncate(&s.title, 40),
                                super::format_amount(s.price, &currency),
                                s.duration_minutes.map_or("-".to_string(), |m| format!("{m} min")),
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
