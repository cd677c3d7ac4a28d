//! Canonical column identifiers of a fund snapshot.
//!
//! These are the names produced by the column normalizer for the headers
//! published by Fundamentus, plus the columns the pipeline derives.

pub const TICKER: &str = "papel";
pub const SEGMENT: &str = "segmento";
pub const PRICE: &str = "cotacao";
pub const FFO_YIELD: &str = "ffo_yield";
pub const DIVIDEND_YIELD: &str = "dividend_yield";
pub const CAP_RATE: &str = "cap_rate";
pub const VACANCY: &str = "vacancia_media";
pub const P_VP: &str = "p_vp";
pub const MARKET_VALUE: &str = "valor_de_mercado";
pub const LIQUIDITY: &str = "liquidez";
pub const PROPERTY_COUNT: &str = "qtd_de_imoveis";
pub const PRICE_PER_M2: &str = "preco_do_m2";
pub const RENT_PER_M2: &str = "aluguel_por_m2";

pub const DY_PCT: &str = "dy_pct";
pub const FFO_PCT: &str = "ffo_pct";
pub const VACANCY_PCT: &str = "vacancia_pct";
pub const MACRO_SEGMENT: &str = "macro_segmento";

pub const FLAG_DY: &str = "dy_bom";
pub const FLAG_PVP: &str = "pvp_bom";
pub const FLAG_LIQUIDITY: &str = "liquidez_ok";
pub const FLAG_VACANCY: &str = "vacancia_ok";
pub const FLAG_SIZE: &str = "tamanho_ok";
pub const SCORE: &str = "score";

/// Columns published as locale-formatted percentage text ("12,86%").
pub const PERCENT_COLUMNS: [&str; 4] = [FFO_YIELD, DIVIDEND_YIELD, CAP_RATE, VACANCY];

/// Purely numeric columns, coerced cell by cell.
pub const NUMERIC_COLUMNS: [&str; 7] = [
    PRICE,
    P_VP,
    MARKET_VALUE,
    LIQUIDITY,
    PROPERTY_COUNT,
    PRICE_PER_M2,
    RENT_PER_M2,
];

/// The five rule flags, in score order.
pub const FLAG_COLUMNS: [&str; 5] = [FLAG_DY, FLAG_PVP, FLAG_LIQUIDITY, FLAG_VACANCY, FLAG_SIZE];

/// Columns that must survive the pipeline for a snapshot to be usable.
pub const DEFAULT_REQUIRED_COLUMNS: [&str; 6] =
    [TICKER, PRICE, SEGMENT, P_VP, LIQUIDITY, MARKET_VALUE];

/// Columns shown for funds that passed the screen.
pub const DISPLAY_COLUMNS: [&str; 10] = [
    TICKER,
    MACRO_SEGMENT,
    SEGMENT,
    PRICE,
    DY_PCT,
    P_VP,
    LIQUIDITY,
    VACANCY_PCT,
    MARKET_VALUE,
    SCORE,
];

/// Columns shown for peer funds.
pub const PEER_COLUMNS: [&str; 6] = [TICKER, SEGMENT, DY_PCT, P_VP, LIQUIDITY, SCORE];

/// Friendly label for a canonical column, falling back to the identifier.
pub fn display_name(column: &str) -> &str {
    match column {
        TICKER => "Fundo",
        MACRO_SEGMENT => "Macro Segmento",
        SEGMENT => "Segmento",
        PRICE => "Cotação (R$)",
        DY_PCT => "Dividend Yield (%)",
        P_VP => "P/VP",
        LIQUIDITY => "Liquidez (R$/dia)",
        VACANCY_PCT => "Vacância (%)",
        MARKET_VALUE => "Valor de Mercado (R$)",
        SCORE => "Score",
        other => other,
    }
}
