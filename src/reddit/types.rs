//! Tipos de dados para as respostas da API do Reddit.
//!
//! As structs `Raw*` espelham o JSON retornado pelos endpoints de listagem,
//! comentário e token. [`Item`] é a forma normalizada consumida pelo bot.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tipo de item do Reddit, identificado pelo prefixo do fullname.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// Post (`t3`).
    Post,
    /// Comentário (`t1`).
    Comment,
}

impl ItemKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ItemKind::Post => "t3",
            ItemKind::Comment => "t1",
        }
    }

    fn from_prefix(kind: &str) -> Option<Self> {
        match kind {
            "t3" => Some(ItemKind::Post),
            "t1" => Some(ItemKind::Comment),
            _ => None,
        }
    }
}

/// Um post ou comentário candidato a receber uma resposta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Identificador base36 (ex.: "abc123"), sem prefixo.
    pub id: String,
    pub kind: ItemKind,
    pub subreddit: String,
    /// `None` quando o autor apagou a conta.
    pub author: Option<String>,
    /// Título do post; para comentários, o título do post pai quando disponível.
    pub title: String,
    /// Selftext do post ou corpo do comentário.
    pub body: String,
    pub locked: bool,
    pub archived: bool,
    pub stickied: bool,
}

impl Item {
    /// Fullname usado pelos endpoints de escrita (ex.: "t3_abc123").
    pub fn fullname(&self) -> String {
        format!("{}_{}", self.kind.prefix(), self.id)
    }

    /// Chave no arquivo de processados. Posts usam o ID puro, compatível com
    /// arquivos antigos; comentários usam o fullname, pois os contadores de
    /// `t1` e `t3` são independentes e podem colidir.
    pub fn dedup_key(&self) -> String {
        match self.kind {
            ItemKind::Post => self.id.clone(),
            ItemKind::Comment => self.fullname(),
        }
    }

    /// Verdadeiro se o item pertence a `username` (comparação sem caixa).
    pub fn is_authored_by(&self, username: &str) -> bool {
        self.author
            .as_deref()
            .is_some_and(|a| a.eq_ignore_ascii_case(username))
    }
}

/// Listagem de onde os candidatos são lidos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Listing {
    #[default]
    Hot,
    New,
    /// Comentários recentes do subreddit.
    Comments,
}

impl Listing {
    pub fn path_segment(&self) -> &'static str {
        match self {
            Listing::Hot => "hot",
            Listing::New => "new",
            Listing::Comments => "comments",
        }
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Direção de voto aceita por `/api/vote`. O bot só emite upvotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
}

impl VoteDirection {
    pub fn as_param(&self) -> &'static str {
        match self {
            VoteDirection::Up => "1",
        }
    }
}

/// Resposta de `/api/v1/access_token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Resposta de `/api/v1/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    pub name: String,
}

/// Envelope de listagem: `{"kind": "Listing", "data": {"children": [...]}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawListing {
    pub data: RawListingData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawListingData {
    #[serde(default)]
    pub children: Vec<RawThing>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawThing {
    pub kind: String,
    pub data: RawThingData,
}

/// Campos comuns de posts (`t3`) e comentários (`t1`).
#[derive(Debug, Clone, Deserialize)]
pub struct RawThingData {
    pub id: String,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link_title: Option<String>,
    #[serde(default)]
    pub selftext: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub stickied: bool,
}

impl RawThing {
    /// Converte para [`Item`]; tipos desconhecidos (ex.: "more") retornam `None`.
    pub fn into_item(self) -> Option<Item> {
        let kind = ItemKind::from_prefix(&self.kind)?;
        let d = self.data;
        let author = d.author.filter(|a| a != "[deleted]");
        let (title, body) = match kind {
            ItemKind::Post => (d.title.unwrap_or_default(), d.selftext.unwrap_or_default()),
            ItemKind::Comment => (d.link_title.unwrap_or_default(), d.body.unwrap_or_default()),
        };
        Some(Item {
            id: d.id,
            kind,
            subreddit: d.subreddit,
            author,
            title,
            body,
            locked: d.locked,
            archived: d.archived,
            stickied: d.stickied,
        })
    }
}

/// Resposta de `/api/comment` com `api_type=json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiJsonResponse {
    pub json: ApiJsonBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiJsonBody {
    /// Triplas `[código, mensagem, campo]`.
    #[serde(default)]
    pub errors: Vec<Vec<serde_json::Value>>,
}

/// Um erro reportado pela API no array `json.errors`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorEntry {
    pub code: String,
    pub message: String,
}

impl ApiJsonBody {
    pub fn error_entries(&self) -> Vec<ApiErrorEntry> {
        self.errors
            .iter()
            .map(|triple| {
                let field = |i: usize| {
                    triple
                        .get(i)
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string()
                };
                ApiErrorEntry {
                    code: field(0),
                    message: field(1),
                }
            })
            .collect()
    }
}
