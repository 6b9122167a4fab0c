//! In-memory record set backing the API.
//!
//! Reads hand out the denormalized shapes the valuation pipelines consume:
//! each analysis leaves with its stock, its sector's reference ratios for
//! the same period, and the stock's growth entries for that period already
//! attached. This is a request-cycle repository, not a persistence layer.

use std::collections::{HashMap, HashSet};

use analysis_core::{
    AnalysisError, EarningAnalysis, GrowthDatum, NewEarningAnalysis, NewGrowthEntry,
    NewRevenueAnalysis, NewSector, NewStock, RevenueAnalysis, Sector, SectorRatio, Stock,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Which growth series a call addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthKind {
    Eps,
    Sales,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEarningAnalysis {
    pub id: i64,
    #[serde(flatten)]
    pub fields: NewEarningAnalysis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRevenueAnalysis {
    pub id: i64,
    #[serde(flatten)]
    pub fields: NewRevenueAnalysis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredGrowthEntry {
    pub id: i64,
    #[serde(flatten)]
    pub entry: NewGrowthEntry,
}

/// Growth entry as returned by the API, with the owning ticker resolved.
#[derive(Debug, Clone, Serialize)]
pub struct GrowthEntryView {
    pub id: i64,
    pub stock_id: i64,
    pub ticker: String,
    pub period: u32,
    pub year: i32,
    pub value: f64,
}

/// Stock as returned by the API, with its sector name resolved.
#[derive(Debug, Clone, Serialize)]
pub struct StockView {
    pub id: i64,
    pub ticker: String,
    pub company_name: String,
    pub sector_id: i64,
    pub sector_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoreInner {
    sectors: Vec<Sector>,
    stocks: Vec<Stock>,
    sector_ratios: Vec<SectorRatio>,
    earning_analyses: Vec<StoredEarningAnalysis>,
    revenue_analyses: Vec<StoredRevenueAnalysis>,
    eps_growth: Vec<StoredGrowthEntry>,
    sales_growth: Vec<StoredGrowthEntry>,
}

impl StoreInner {
    fn stock(&self, id: i64) -> Option<&Stock> {
        self.stocks.iter().find(|s| s.id == id)
    }

    fn sector_ratio(&self, sector_id: i64, period: u32) -> Option<SectorRatio> {
        self.sector_ratios
            .iter()
            .find(|r| r.sector_id == sector_id && r.period == period)
            .copied()
    }

    fn growth_series(&self, kind: GrowthKind, stock_id: i64, period: u32) -> Vec<GrowthDatum> {
        let entries = match kind {
            GrowthKind::Eps => &self.eps_growth,
            GrowthKind::Sales => &self.sales_growth,
        };
        let mut series: Vec<GrowthDatum> = entries
            .iter()
            .filter(|g| g.entry.stock_id == stock_id && g.entry.period == period)
            .map(|g| GrowthDatum {
                year: g.entry.year,
                value: g.entry.value,
            })
            .collect();
        series.sort_by_key(|g| g.year);
        series
    }

    fn join_earning(&self, stored: &StoredEarningAnalysis) -> Option<EarningAnalysis> {
        let stock = self.stock(stored.fields.stock_id)?.clone();
        let sector_ratio = self.sector_ratio(stock.sector_id, stored.fields.period);
        let eps_growth_data =
            self.growth_series(GrowthKind::Eps, stock.id, stored.fields.period);
        Some(EarningAnalysis {
            id: stored.id,
            period: stored.fields.period,
            price: stored.fields.price,
            pe: stored.fields.pe,
            roa: stored.fields.roa,
            eps_revision_grade: stored.fields.eps_revision_grade,
            eps_growth_adjusted_rate: stored.fields.eps_growth_adjusted_rate,
            eps_growth_data,
            sector_ratio,
            stock,
        })
    }

    fn join_revenue(&self, stored: &StoredRevenueAnalysis) -> Option<RevenueAnalysis> {
        let stock = self.stock(stored.fields.stock_id)?.clone();
        let sector_ratio = self.sector_ratio(stock.sector_id, stored.fields.period);
        let sales_growth_data =
            self.growth_series(GrowthKind::Sales, stock.id, stored.fields.period);
        Some(RevenueAnalysis {
            id: stored.id,
            period: stored.fields.period,
            price: stored.fields.price,
            ps: stored.fields.ps,
            operating_margin: stored.fields.operating_margin,
            sales_growth_adjusted_rate: stored.fields.sales_growth_adjusted_rate,
            sales_growth_data,
            sector_ratio,
            stock,
        })
    }
}

fn next_id<T>(items: &[T], id_of: impl Fn(&T) -> i64) -> i64 {
    items.iter().map(id_of).max().unwrap_or(0) + 1
}

#[derive(Debug, Default)]
pub struct RecordStore {
    inner: RwLock<StoreInner>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the whole record set from a JSON seed file.
    pub fn from_seed_file(path: &str) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let inner: StoreInner = serde_json::from_str(&data)?;
        Ok(Self {
            inner: RwLock::new(inner),
        })
    }

    pub async fn sectors(&self) -> Vec<Sector> {
        self.inner.read().await.sectors.clone()
    }

    pub async fn stocks(&self) -> Vec<StockView> {
        let inner = self.inner.read().await;
        inner
            .stocks
            .iter()
            .map(|stock| StockView {
                id: stock.id,
                ticker: stock.ticker.clone(),
                company_name: stock.company_name.clone(),
                sector_id: stock.sector_id,
                sector_name: inner
                    .sectors
                    .iter()
                    .find(|s| s.id == stock.sector_id)
                    .map(|s| s.name.clone()),
            })
            .collect()
    }

    /// Uppercased ticker -> id map for bulk-upload screening.
    pub async fn ticker_index(&self) -> HashMap<String, i64> {
        self.inner
            .read()
            .await
            .stocks
            .iter()
            .map(|s| (s.ticker.to_uppercase(), s.id))
            .collect()
    }

    pub async fn earning_keys(&self) -> HashSet<(i64, u32)> {
        self.inner
            .read()
            .await
            .earning_analyses
            .iter()
            .map(|a| (a.fields.stock_id, a.fields.period))
            .collect()
    }

    pub async fn revenue_keys(&self) -> HashSet<(i64, u32)> {
        self.inner
            .read()
            .await
            .revenue_analyses
            .iter()
            .map(|a| (a.fields.stock_id, a.fields.period))
            .collect()
    }

    pub async fn growth_keys(&self, kind: GrowthKind) -> HashSet<(i64, u32, i32)> {
        let inner = self.inner.read().await;
        let entries = match kind {
            GrowthKind::Eps => &inner.eps_growth,
            GrowthKind::Sales => &inner.sales_growth,
        };
        entries
            .iter()
            .map(|g| (g.entry.stock_id, g.entry.period, g.entry.year))
            .collect()
    }

    pub async fn insert_sector(&self, new: NewSector) -> Result<Sector, AnalysisError> {
        if new.name.trim().is_empty() {
            return Err(AnalysisError::InvalidData(
                "Sector name must not be empty".to_string(),
            ));
        }
        let mut inner = self.inner.write().await;
        if inner
            .sectors
            .iter()
            .any(|s| s.name.eq_ignore_ascii_case(new.name.trim()))
        {
            return Err(AnalysisError::Duplicate(format!(
                "Sector '{}' already exists",
                new.name.trim()
            )));
        }
        let sector = Sector {
            id: next_id(&inner.sectors, |s| s.id),
            name: new.name.trim().to_string(),
            description: new.description,
        };
        inner.sectors.push(sector.clone());
        Ok(sector)
    }

    pub async fn insert_stock(&self, new: NewStock) -> Result<Stock, AnalysisError> {
        let ticker = new.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(AnalysisError::InvalidData(
                "Ticker must not be empty".to_string(),
            ));
        }
        let mut inner = self.inner.write().await;
        if inner.sectors.iter().all(|s| s.id != new.sector_id) {
            return Err(AnalysisError::NotFound("Sector not found".to_string()));
        }
        if inner.stocks.iter().any(|s| s.ticker == ticker) {
            return Err(AnalysisError::Duplicate(format!(
                "Stock with ticker '{ticker}' already exists"
            )));
        }
        let stock = Stock {
            id: next_id(&inner.stocks, |s| s.id),
            ticker,
            company_name: new.company_name,
            sector_id: new.sector_id,
        };
        inner.stocks.push(stock.clone());
        Ok(stock)
    }

    /// Fetch earning analyses with optional filters, newest period first,
    /// each joined with its stock, sector ratio, and growth history.
    pub async fn fetch_earning_analyses(
        &self,
        stock_id: Option<i64>,
        period: Option<u32>,
    ) -> Vec<EarningAnalysis> {
        let inner = self.inner.read().await;
        let mut analyses: Vec<EarningAnalysis> = inner
            .earning_analyses
            .iter()
            .filter(|a| stock_id.map_or(true, |id| a.fields.stock_id == id))
            .filter(|a| period.map_or(true, |p| a.fields.period == p))
            .filter_map(|a| inner.join_earning(a))
            .collect();
        analyses.sort_by(|a, b| b.period.cmp(&a.period).then(b.id.cmp(&a.id)));
        analyses
    }

    /// Revenue twin of [`Self::fetch_earning_analyses`].
    pub async fn fetch_revenue_analyses(
        &self,
        stock_id: Option<i64>,
        period: Option<u32>,
    ) -> Vec<RevenueAnalysis> {
        let inner = self.inner.read().await;
        let mut analyses: Vec<RevenueAnalysis> = inner
            .revenue_analyses
            .iter()
            .filter(|a| stock_id.map_or(true, |id| a.fields.stock_id == id))
            .filter(|a| period.map_or(true, |p| a.fields.period == p))
            .filter_map(|a| inner.join_revenue(a))
            .collect();
        analyses.sort_by(|a, b| b.period.cmp(&a.period).then(b.id.cmp(&a.id)));
        analyses
    }

    pub async fn insert_earning_analysis(
        &self,
        new: NewEarningAnalysis,
    ) -> Result<EarningAnalysis, AnalysisError> {
        let mut inner = self.inner.write().await;
        let ticker = inner
            .stock(new.stock_id)
            .map(|s| s.ticker.clone())
            .ok_or_else(|| AnalysisError::NotFound("Stock not found".to_string()))?;
        if inner
            .earning_analyses
            .iter()
            .any(|a| a.fields.stock_id == new.stock_id && a.fields.period == new.period)
        {
            return Err(AnalysisError::Duplicate(format!(
                "Analysis for {} in period {} already exists",
                ticker, new.period
            )));
        }
        let stored = StoredEarningAnalysis {
            id: next_id(&inner.earning_analyses, |a| a.id),
            fields: new,
        };
        let joined = inner
            .join_earning(&stored)
            .ok_or_else(|| AnalysisError::NotFound("Stock not found".to_string()))?;
        inner.earning_analyses.push(stored);
        Ok(joined)
    }

    pub async fn insert_revenue_analysis(
        &self,
        new: NewRevenueAnalysis,
    ) -> Result<RevenueAnalysis, AnalysisError> {
        let mut inner = self.inner.write().await;
        let ticker = inner
            .stock(new.stock_id)
            .map(|s| s.ticker.clone())
            .ok_or_else(|| AnalysisError::NotFound("Stock not found".to_string()))?;
        if inner
            .revenue_analyses
            .iter()
            .any(|a| a.fields.stock_id == new.stock_id && a.fields.period == new.period)
        {
            return Err(AnalysisError::Duplicate(format!(
                "Analysis for {} in period {} already exists",
                ticker, new.period
            )));
        }
        let stored = StoredRevenueAnalysis {
            id: next_id(&inner.revenue_analyses, |a| a.id),
            fields: new,
        };
        let joined = inner
            .join_revenue(&stored)
            .ok_or_else(|| AnalysisError::NotFound("Stock not found".to_string()))?;
        inner.revenue_analyses.push(stored);
        Ok(joined)
    }

    /// Append pre-screened earning rows. Returns the number stored.
    pub async fn insert_earning_bulk(&self, rows: Vec<NewEarningAnalysis>) -> usize {
        let mut inner = self.inner.write().await;
        let mut id = next_id(&inner.earning_analyses, |a| a.id);
        let count = rows.len();
        for fields in rows {
            inner
                .earning_analyses
                .push(StoredEarningAnalysis { id, fields });
            id += 1;
        }
        count
    }

    /// Append pre-screened revenue rows. Returns the number stored.
    pub async fn insert_revenue_bulk(&self, rows: Vec<NewRevenueAnalysis>) -> usize {
        let mut inner = self.inner.write().await;
        let mut id = next_id(&inner.revenue_analyses, |a| a.id);
        let count = rows.len();
        for fields in rows {
            inner
                .revenue_analyses
                .push(StoredRevenueAnalysis { id, fields });
            id += 1;
        }
        count
    }

    pub async fn fetch_growth(
        &self,
        kind: GrowthKind,
        stock_id: Option<i64>,
        period: Option<u32>,
        year: Option<i32>,
    ) -> Vec<GrowthEntryView> {
        let inner = self.inner.read().await;
        let entries = match kind {
            GrowthKind::Eps => &inner.eps_growth,
            GrowthKind::Sales => &inner.sales_growth,
        };
        let mut views: Vec<GrowthEntryView> = entries
            .iter()
            .filter(|g| stock_id.map_or(true, |id| g.entry.stock_id == id))
            .filter(|g| period.map_or(true, |p| g.entry.period == p))
            .filter(|g| year.map_or(true, |y| g.entry.year == y))
            .filter_map(|g| {
                let stock = inner.stock(g.entry.stock_id)?;
                Some(GrowthEntryView {
                    id: g.id,
                    stock_id: g.entry.stock_id,
                    ticker: stock.ticker.clone(),
                    period: g.entry.period,
                    year: g.entry.year,
                    value: g.entry.value,
                })
            })
            .collect();
        views.sort_by(|a, b| {
            b.year
                .cmp(&a.year)
                .then(b.period.cmp(&a.period))
                .then(b.id.cmp(&a.id))
        });
        views
    }

    pub async fn insert_growth_entry(
        &self,
        kind: GrowthKind,
        new: NewGrowthEntry,
    ) -> Result<GrowthEntryView, AnalysisError> {
        let mut inner = self.inner.write().await;
        let ticker = inner
            .stock(new.stock_id)
            .map(|s| s.ticker.clone())
            .ok_or_else(|| AnalysisError::NotFound("Stock not found".to_string()))?;
        let entries = match kind {
            GrowthKind::Eps => &inner.eps_growth,
            GrowthKind::Sales => &inner.sales_growth,
        };
        if entries.iter().any(|g| {
            g.entry.stock_id == new.stock_id
                && g.entry.period == new.period
                && g.entry.year == new.year
        }) {
            return Err(AnalysisError::Duplicate(format!(
                "Growth entry for {} in period {}, year {} already exists",
                ticker, new.period, new.year
            )));
        }
        let id = next_id(entries, |g| g.id);
        let view = GrowthEntryView {
            id,
            stock_id: new.stock_id,
            ticker,
            period: new.period,
            year: new.year,
            value: new.value,
        };
        let stored = StoredGrowthEntry { id, entry: new };
        match kind {
            GrowthKind::Eps => inner.eps_growth.push(stored),
            GrowthKind::Sales => inner.sales_growth.push(stored),
        }
        Ok(view)
    }

    /// Append pre-screened growth entries. Returns the number stored.
    pub async fn insert_growth_bulk(&self, kind: GrowthKind, rows: Vec<NewGrowthEntry>) -> usize {
        let mut inner = self.inner.write().await;
        let count = rows.len();
        let entries = match kind {
            GrowthKind::Eps => &mut inner.eps_growth,
            GrowthKind::Sales => &mut inner.sales_growth,
        };
        let mut id = next_id(entries, |g| g.id);
        for entry in rows {
            entries.push(StoredGrowthEntry { id, entry });
            id += 1;
        }
        count
    }
}
