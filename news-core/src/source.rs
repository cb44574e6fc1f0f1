//! Article data sources.
//!
//! [`SimulatedSource`] stands in for a news-provider API: it waits a fixed
//! latency (observing cancellation) and synthesizes deterministic pages.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rand::seq::SliceRandom;

use crate::error::FeedError;
use crate::models::{Article, Category, CategoryFilter, Outlet};
use crate::request::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedQuery {
    Category(CategoryFilter),
    Interests(Vec<Category>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub query: FeedQuery,
    pub page: u32,
    pub page_size: usize,
    pub force_refresh: bool,
}

#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch_page(
        &self,
        request: &PageRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<Article>, FeedError>;
}

#[derive(Debug, Clone)]
pub struct SimulatedSource {
    category_latency: Duration,
    personalized_latency: Duration,
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new(Duration::from_millis(800), Duration::from_millis(600))
    }
}

impl SimulatedSource {
    pub fn new(category_latency: Duration, personalized_latency: Duration) -> Self {
        Self {
            category_latency,
            personalized_latency,
        }
    }

    fn latency_for(&self, query: &FeedQuery) -> Duration {
        match query {
            FeedQuery::Category(_) => self.category_latency,
            FeedQuery::Interests(_) => self.personalized_latency,
        }
    }
}

#[async_trait]
impl ArticleSource for SimulatedSource {
    async fn fetch_page(
        &self,
        request: &PageRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<Article>, FeedError> {
        if request.page == 0 {
            return Err(FeedError::InvalidPage(0));
        }
        if cancel.is_cancelled() {
            return Err(FeedError::Cancelled);
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(FeedError::Cancelled),
            _ = tokio::time::sleep(self.latency_for(&request.query)) => {}
        }

        let articles = match &request.query {
            FeedQuery::Category(filter) => category_page(
                *filter,
                request.page,
                request.page_size,
                request.force_refresh,
            ),
            FeedQuery::Interests(interests) => {
                let mut mixed = interest_page(interests, request.page, request.page_size);
                mixed.shuffle(&mut rand::thread_rng());
                mixed.truncate(request.page_size);
                mixed
            }
        };
        Ok(articles)
    }
}

/// Page of a category feed: the curated set on a plain first load, generated
/// articles otherwise.
pub fn category_page(
    filter: CategoryFilter,
    page: u32,
    page_size: usize,
    force_refresh: bool,
) -> Vec<Article> {
    if page == 1 && !force_refresh {
        return curated_articles()
            .into_iter()
            .filter(|a| filter.matches(a.category))
            .take(page_size)
            .collect();
    }

    let mut articles = generated_articles(page, page_size);
    if let CategoryFilter::Only(category) = filter {
        for article in &mut articles {
            article.category = category;
        }
    }
    articles
}

/// Unshuffled mix for an interest set: `ceil(page_size / n)` articles per
/// interest, ids suffixed with `-{category}-{page}`.
pub fn interest_page(interests: &[Category], page: u32, page_size: usize) -> Vec<Article> {
    if interests.is_empty() {
        return Vec::new();
    }
    let per_category = page_size.div_ceil(interests.len());

    let mut mixed = Vec::with_capacity(per_category * interests.len());
    for (idx, category) in interests.iter().enumerate() {
        let base = if idx % 2 == 0 {
            curated_articles()
        } else {
            generated_articles(page + idx as u32, per_category)
        };
        mixed.extend(base.into_iter().take(per_category).map(|mut article| {
            article.id = format!("{}-{}-{}", article.id, category, page);
            article.category = *category;
            article
        }));
    }
    mixed
}

const GENERATED_SOURCES: [&str; 7] = [
    "BBC Mundo",
    "CNN Español",
    "El País",
    "Reuters",
    "Bloomberg",
    "TechCrunch",
    "The Verge",
];

pub fn generated_articles(page: u32, page_size: usize) -> Vec<Article> {
    let now = Utc::now();
    (0..page_size)
        .map(|i| {
            let index = (page.saturating_sub(1) as usize) * page_size + i;
            let category = Category::ALL[index % Category::ALL.len()];
            let hours_ago = index as i64 * 2 + 12;
            Article {
                id: format!("generated-{page}-{i}"),
                title: format!("Noticia {}: Avances importantes en {}", index + 1, category),
                description: format!(
                    "Resumen de los últimos acontecimientos en el sector de {category}. \
                     Esta noticia cubre los eventos más relevantes del día."
                ),
                content: "Contenido completo de la noticia...".to_string(),
                url: format!("https://example.com/news/{index}"),
                image_url: format!("https://picsum.photos/800/450?random={index}"),
                published_at: now - ChronoDuration::hours(hours_ago),
                source: Outlet {
                    name: GENERATED_SOURCES[index % GENERATED_SOURCES.len()].to_string(),
                    url: "https://example.com".to_string(),
                },
                category,
                author: Some(format!("Autor {}", index + 1)),
            }
        })
        .collect()
}

struct Curated {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    content: &'static str,
    slug: &'static str,
    image: &'static str,
    hours_ago: i64,
    source: (&'static str, &'static str),
    category: Category,
    author: &'static str,
}

const CURATED: [Curated; 12] = [
    Curated {
        id: "1",
        title: "Inteligencia Artificial revoluciona la medicina moderna",
        description: "Nuevos avances en IA permiten diagnósticos más precisos y tratamientos personalizados para pacientes de todo el mundo.",
        content: "La inteligencia artificial está transformando el campo de la medicina...",
        slug: "ai-medicine",
        image: "photo-1576091160399-112ba8d25d1d",
        hours_ago: 2,
        source: ("TechNews", "https://technews.com"),
        category: Category::Technology,
        author: "María García",
    },
    Curated {
        id: "2",
        title: "Descubrimiento arqueológico cambia la historia antigua",
        description: "Un equipo internacional de arqueólogos ha descubierto ruinas que podrían reescribir lo que sabemos sobre las civilizaciones antiguas.",
        content: "El descubrimiento fue realizado en el desierto de Egipto...",
        slug: "archaeology",
        image: "photo-1599940824399-b87987ce0799",
        hours_ago: 5,
        source: ("Historia Hoy", "https://historiahoy.com"),
        category: Category::Science,
        author: "Carlos Ruiz",
    },
    Curated {
        id: "3",
        title: "Mercados financieros alcanzan máximos históricos",
        description: "Los principales índices bursátiles han cerrado en niveles récord impulsados por datos económicos positivos.",
        content: "Wall Street celebró hoy con números verdes...",
        slug: "markets",
        image: "photo-1611974765270-ca1258634369",
        hours_ago: 8,
        source: ("Finanzas Global", "https://finanzas.com"),
        category: Category::Business,
        author: "Ana Martínez",
    },
    Curated {
        id: "4",
        title: "Nueva película de Marvel rompe récords de taquilla",
        description: "La última entrega del universo cinematográfico ha recaudado más de 500 millones en su primer fin de semana.",
        content: "Los fans acudieron masivamente a los cines...",
        slug: "marvel",
        image: "photo-1536440136628-849c177e76a1",
        hours_ago: 12,
        source: ("CineTotal", "https://cinetotal.com"),
        category: Category::Entertainment,
        author: "Pedro López",
    },
    Curated {
        id: "5",
        title: "Descubren nueva especie de ballena en el Pacífico",
        description: "Científicos marinos han identificado una especie previamente desconocida de cetáceo en aguas profundas.",
        content: "La expedición duró más de 6 meses...",
        slug: "whale",
        image: "photo-1568430462989-44163eb1752f",
        hours_ago: 24,
        source: ("National Geographic", "https://natgeo.com"),
        category: Category::Science,
        author: "Laura Sánchez",
    },
    Curated {
        id: "6",
        title: "Real Madrid gana la Champions League",
        description: "El equipo merengue se coronó campeón de Europa por decimoquinta vez en su historia.",
        content: "Un gol en el minuto 90 decidió el partido...",
        slug: "champions",
        image: "photo-1577223625816-7546f13df25d",
        hours_ago: 36,
        source: ("ESPN", "https://espn.com"),
        category: Category::Sports,
        author: "Juan Pérez",
    },
    Curated {
        id: "7",
        title: "Nuevo tratamiento contra el cáncer muestra resultados prometedores",
        description: "Ensayos clínicos de fase III demuestran una tasa de remisión del 85% en pacientes con cáncer de pulmón.",
        content: "El tratamiento utiliza terapia génica...",
        slug: "cancer",
        image: "photo-1579684385127-1ef15d508118",
        hours_ago: 48,
        source: ("Medical News", "https://medicalnews.com"),
        category: Category::Health,
        author: "Dra. Elena Vargas",
    },
    Curated {
        id: "8",
        title: "Apple presenta nuevos productos en evento especial",
        description: "La compañía de Cupertino reveló su última línea de dispositivos con innovadoras características de IA.",
        content: "El evento se llevó a cabo en el Apple Park...",
        slug: "apple",
        image: "photo-1491933382434-500287f9b54b",
        hours_ago: 3,
        source: ("AppleInsider", "https://appleinsider.com"),
        category: Category::Technology,
        author: "Miguel Torres",
    },
    Curated {
        id: "9",
        title: "Cumbre mundial sobre cambio climático alcanza acuerdo histórico",
        description: "195 países acuerdan reducir emisiones de carbono en un 50% para 2030.",
        content: "La cumbre duró dos semanas de negociaciones intensas...",
        slug: "climate",
        image: "photo-1569163139599-0f4517e36f51",
        hours_ago: 6,
        source: ("BBC Mundo", "https://bbc.com"),
        category: Category::General,
        author: "Sofia Hernández",
    },
    Curated {
        id: "10",
        title: "Tesla anuncia baterías de nueva generación",
        description: "Las nuevas baterías prometen el doble de autonomía y tiempos de carga reducidos a la mitad.",
        content: "Elon Musk presentó la tecnología en conferencia de prensa...",
        slug: "tesla",
        image: "photo-1560958089-b8a1929cea89",
        hours_ago: 10,
        source: ("Electrek", "https://electrek.com"),
        category: Category::Technology,
        author: "Roberto Díaz",
    },
    Curated {
        id: "11",
        title: "Misión espacial llega exitosamente a Marte",
        description: "La sonda exploradora ha comenzado su misión de 2 años para buscar signos de vida pasada.",
        content: "El aterrizaje fue transmitido en vivo a millones...",
        slug: "mars",
        image: "photo-1614728853913-1e221a657a63",
        hours_ago: 14,
        source: ("NASA News", "https://nasa.gov"),
        category: Category::Science,
        author: "Dr. James Wilson",
    },
    Curated {
        id: "12",
        title: "Gobierno anuncia reforma fiscal integral",
        description: "Las nuevas medidas buscan reducir la evasión y aumentar la recaudación sin afectar a la clase media.",
        content: "La reforma será discutida en el congreso...",
        slug: "tax",
        image: "photo-1554224155-6726b3ff858f",
        hours_ago: 18,
        source: ("El País", "https://elpais.com"),
        category: Category::General,
        author: "Carmen Vega",
    },
];

/// The fixed editorial selection served as the first page of every category.
pub fn curated_articles() -> Vec<Article> {
    let now = Utc::now();
    CURATED
        .iter()
        .map(|c| Article {
            id: c.id.to_string(),
            title: c.title.to_string(),
            description: c.description.to_string(),
            content: c.content.to_string(),
            url: format!("https://example.com/{}", c.slug),
            image_url: format!("https://images.unsplash.com/{}?w=800&q=80", c.image),
            published_at: now - ChronoDuration::hours(c.hours_ago),
            source: Outlet {
                name: c.source.0.to_string(),
                url: c.source.1.to_string(),
            },
            category: c.category,
            author: Some(c.author.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn first_page_filters_curated_set_by_category() {
        let science = category_page(Category::Science.into(), 1, 10, false);
        let ids: Vec<_> = science.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["2", "5", "11"]);

        let all = category_page(CategoryFilter::All, 1, 10, false);
        assert_eq!(all.len(), 10);
        assert_eq!(all[0].id, "1");
    }

    #[test]
    fn refresh_and_later_pages_use_generator_with_category_override() {
        let refreshed = category_page(Category::Sports.into(), 1, 10, true);
        assert_eq!(refreshed.len(), 10);
        assert_eq!(refreshed[0].id, "generated-1-0");
        assert!(refreshed.iter().all(|a| a.category == Category::Sports));

        let third = category_page(CategoryFilter::All, 3, 10, false);
        assert_eq!(third[0].id, "generated-3-0");
        assert_eq!(third[0].title, "Noticia 21: Avances importantes en technology");
    }

    #[test]
    fn generator_is_deterministic_apart_from_timestamps() {
        let a = generated_articles(2, 5);
        let b = generated_articles(2, 5);
        let ids_a: Vec<_> = a.iter().map(|x| &x.id).collect();
        let ids_b: Vec<_> = b.iter().map(|x| &x.id).collect();
        assert_eq!(ids_a, ids_b);
        assert_eq!(a[1].source.name, "The Verge");
        assert_eq!(a[1].url, "https://example.com/news/6");
    }

    #[test]
    fn interest_mix_splits_page_and_tags_ids() {
        let interests = [Category::General, Category::Technology, Category::Science];
        let mixed = interest_page(&interests, 2, 10);

        // ceil(10 / 3) = 4 per interest
        assert_eq!(mixed.len(), 12);
        let ids: HashSet<_> = mixed.iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids.len(), mixed.len(), "composite ids must be unique");
        assert!(ids.contains("1-general-2"));
        assert!(ids.contains("1-science-2"));
        assert!(ids.contains("generated-3-0-technology-2"));
        assert_eq!(
            mixed.iter().filter(|a| a.category == Category::Technology).count(),
            4
        );
    }

    #[test]
    fn empty_interest_set_yields_nothing() {
        assert!(interest_page(&[], 1, 10).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_fetch_honours_cancellation() {
        let source = SimulatedSource::default();
        let token = CancellationToken::new();
        let request = PageRequest {
            query: FeedQuery::Category(CategoryFilter::All),
            page: 1,
            page_size: 10,
            force_refresh: false,
        };

        let fetch = {
            let token = token.clone();
            tokio::spawn(async move { source.fetch_page(&request, &token).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();

        let result = fetch.await.unwrap();
        assert!(matches!(result, Err(FeedError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn personalized_fetch_truncates_to_page_size() {
        let source = SimulatedSource::default();
        let request = PageRequest {
            query: FeedQuery::Interests(vec![
                Category::Health,
                Category::Sports,
                Category::Business,
            ]),
            page: 1,
            page_size: 10,
            force_refresh: false,
        };
        let page = source
            .fetch_page(&request, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(page.len(), 10);
    }
}
