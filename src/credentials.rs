//! Proxy pool and extractor tokens, loaded once at startup.

use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use miette::{Context, IntoDiagnostic};
use tracing::{debug, info, warn};

use crate::{
    result::{bail, Result},
    types::Proxy,
    utils::MutexUtils,
};

/// The two opaque values the extractor needs to authorize stream requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub visitor_data: String,
    pub po_token: String,
}

/// Anything able to supply a token pair
pub trait TokenProvider: Sync {
    fn provide(&self) -> Result<TokenPair>;
}

/// Token pair stored in a two-line text file:
/// the visitor data on the first line, the PO token on the second.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached pair.
    ///
    /// Return `None` if the file does not exist, cannot be read
    /// or does not contain exactly two non-empty lines.
    pub fn read(&self) -> Option<TokenPair> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) => {
                debug!("Could not read token cache {:?}: {err}", self.path);
                return None;
            }
        };

        match content.lines().map(str::trim).collect::<Vec<_>>()[..] {
            [visitor_data, po_token] if !visitor_data.is_empty() && !po_token.is_empty() => {
                Some(TokenPair {
                    visitor_data: visitor_data.to_owned(),
                    po_token: po_token.to_owned(),
                })
            }
            _ => None,
        }
    }

    pub fn write(&self, tokens: &TokenPair) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .into_diagnostic()
                .wrap_err("Could not create token cache parent directories")?;
        }

        fs::write(
            &self.path,
            format!("{}\n{}", tokens.visitor_data, tokens.po_token),
        )
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not write token cache {:?}", self.path))?;

        Ok(())
    }
}

impl TokenProvider for TokenCache {
    fn provide(&self) -> Result<TokenPair> {
        match self.read() {
            Some(tokens) => Ok(tokens),
            None => bail(format!(
                "Token cache {:?} is missing or malformed",
                self.path
            )),
        }
    }
}

/// Ask the operator for the tokens
pub struct Prompt<R, W> {
    io: Mutex<(R, W)>,
}

impl Prompt<io::BufReader<io::Stdin>, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::BufReader::new(io::stdin()), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            io: Mutex::new((input, output)),
        }
    }

    /// Ask until a non-blank answer is given.
    /// The end of the input is an error.
    fn ask(input: &mut R, output: &mut W, question: &str) -> Result<String> {
        loop {
            write!(output, "{question}: ")?;
            output.flush()?;

            let mut answer = String::new();
            if input.read_line(&mut answer)? == 0 {
                return bail(format!("No answer given to '{question}'"));
            }

            let answer = answer.trim();
            if !answer.is_empty() {
                return Ok(answer.to_owned());
            }
            writeln!(output, "A value is required")?;
        }
    }
}

impl<R: BufRead + Send, W: Write + Send> TokenProvider for Prompt<R, W> {
    fn provide(&self) -> Result<TokenPair> {
        self.io.with_lock(|mut io| {
            let (input, output) = &mut *io;
            let visitor_data = Self::ask(input, output, "Enter your visitorData")?;
            let po_token = Self::ask(input, output, "Enter your PoToken")?;
            Ok(TokenPair {
                visitor_data,
                po_token,
            })
        })
    }
}

/// Proxies to pick from, possibly none
#[derive(Debug, Default)]
pub struct ProxyPool {
    proxies: Vec<Proxy>,
    rng: Mutex<fastrand::Rng>,
}

impl ProxyPool {
    pub fn new(proxies: Vec<Proxy>) -> Self {
        Self {
            proxies,
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Uniformly choose a proxy, or `None` when the pool is empty
    pub fn random(&self) -> Option<&Proxy> {
        if self.proxies.is_empty() {
            return None;
        }

        let idx = self.rng.with_lock(|mut rng| rng.usize(..self.proxies.len()));
        self.proxies.get(idx)
    }
}

/// Proxies and tokens, immutable once loaded
#[derive(Debug)]
pub struct CredentialStore {
    proxies: ProxyPool,
    tokens: TokenPair,
}

impl CredentialStore {
    /// Load the tokens from the cache, or from the fallback provider
    /// if the cache is missing or malformed.
    ///
    /// Tokens given by the fallback are written back to the cache.
    /// Failing to write them is not fatal.
    pub fn load(
        proxies: ProxyPool,
        cache: &TokenCache,
        fallback: &dyn TokenProvider,
    ) -> Result<Self> {
        if proxies.is_empty() {
            warn!("No proxy configured. Requests will be sent directly");
        } else {
            info!("{} proxies configured", proxies.len());
        }

        let tokens = match cache.read() {
            Some(tokens) => {
                info!("Loaded visitorData and PoToken from {:?}", cache.path());
                tokens
            }
            None => {
                warn!(
                    "Token cache {:?} is missing or malformed. Asking for new tokens",
                    cache.path()
                );
                let tokens = fallback
                    .provide()
                    .map_err(|err| err.wrap_err_with(|| "Could not get visitorData and PoToken"))?;

                match cache.write(&tokens) {
                    Ok(()) => info!("visitorData and PoToken saved to {:?}", cache.path()),
                    Err(err) => warn!("{err}"),
                }
                tokens
            }
        };

        Ok(Self { proxies, tokens })
    }

    pub fn random_proxy(&self) -> Option<&Proxy> {
        self.proxies.random()
    }

    pub fn tokens(&self) -> &TokenPair {
        &self.tokens
    }
}

impl TokenProvider for CredentialStore {
    fn provide(&self) -> Result<TokenPair> {
        Ok(self.tokens().clone())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tempfile::TempDir;

    use super::*;

    fn pool(list: &str) -> ProxyPool {
        ProxyPool::new(Proxy::parse_list(list).unwrap())
    }

    fn pair(visitor_data: &str, po_token: &str) -> TokenPair {
        TokenPair {
            visitor_data: visitor_data.to_owned(),
            po_token: po_token.to_owned(),
        }
    }

    struct Panicking;

    impl TokenProvider for Panicking {
        fn provide(&self) -> Result<TokenPair> {
            panic!("fallback provider must not be called")
        }
    }

    #[test]
    fn empty_pool_gives_no_proxy() {
        let pool = pool("");
        for _ in 0..10 {
            assert!(pool.random().is_none());
        }
    }

    #[test]
    fn single_proxy_is_always_chosen() {
        let pool = pool("10.0.0.1:3128");
        for _ in 0..20 {
            assert_eq!(pool.random().unwrap().as_str(), "http://10.0.0.1:3128");
        }
    }

    #[test]
    fn random_proxy_is_a_pool_member() {
        let configured = Proxy::parse_list("10.0.0.1:3128,10.0.0.2:3128,10.0.0.3:3128").unwrap();
        let pool = ProxyPool::new(configured.clone());

        let mut seen = vec![false; configured.len()];
        for _ in 0..300 {
            let proxy = pool.random().unwrap();
            let idx = configured.iter().position(|p| p == proxy).unwrap();
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn valid_cache_is_used_as_is() {
        let dir = TempDir::new().unwrap();
        let cache = TokenCache::new(dir.path().join("po_token_cache.txt"));
        fs::write(cache.path(), "visitor\ntoken\n").unwrap();

        let store = CredentialStore::load(pool(""), &cache, &Panicking).unwrap();
        assert_eq!(store.tokens(), &pair("visitor", "token"));
    }

    #[test]
    fn one_line_cache_prompts_and_rewrites() {
        let dir = TempDir::new().unwrap();
        let cache = TokenCache::new(dir.path().join("po_token_cache.txt"));
        fs::write(cache.path(), "only-visitor\n").unwrap();

        let prompt = Prompt::new(Cursor::new("new-visitor\nnew-token\n"), Vec::new());
        let store = CredentialStore::load(pool(""), &cache, &prompt).unwrap();

        assert_eq!(store.tokens(), &pair("new-visitor", "new-token"));
        let content = fs::read_to_string(cache.path()).unwrap();
        assert_eq!(content.lines().collect::<Vec<_>>(), ["new-visitor", "new-token"]);
    }

    #[test]
    fn missing_cache_is_created() {
        let dir = TempDir::new().unwrap();
        let cache = TokenCache::new(dir.path().join("nested").join("tokens.txt"));

        let prompt = Prompt::new(Cursor::new("v\np\n"), Vec::new());
        CredentialStore::load(pool(""), &cache, &prompt).unwrap();

        assert_eq!(cache.read(), Some(pair("v", "p")));
    }

    #[test]
    fn prompt_asks_again_after_blank_answers() {
        let prompt = Prompt::new(Cursor::new("\n  \nvisitor\n\ntoken\n"), Vec::new());
        assert_eq!(prompt.provide().unwrap(), pair("visitor", "token"));

        let (_, output) = prompt.io.into_inner().unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.matches("Enter your visitorData").count(), 3);
        assert_eq!(output.matches("Enter your PoToken").count(), 2);
    }

    #[test]
    fn prompt_fails_at_end_of_input() {
        let prompt = Prompt::new(Cursor::new("visitor\n\n"), Vec::new());
        assert!(prompt.provide().is_err());
    }

    #[test]
    fn cache_with_blank_line_is_malformed() {
        let dir = TempDir::new().unwrap();
        let cache = TokenCache::new(dir.path().join("tokens.txt"));
        fs::write(cache.path(), "visitor\n   \n").unwrap();

        assert!(cache.read().is_none());
        assert!(cache.provide().is_err());
    }
}
