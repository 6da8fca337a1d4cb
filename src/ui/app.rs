use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::chat::{ChatSession, SendOutcome, SessionEvent};
use crate::config::AppSettings;
use crate::llm::ChatClient;
use crate::project::works::DEFAULT_WORK_TITLE;
use crate::project::{Material, MaterialKind, Project};
use crate::prompts::PromptManager;
use crate::shortcuts::{find_shortcut, Shortcut, SHORTCUTS};
use crate::storage::{ProjectStore, Storage};
use crate::ui::dialogs::{Console, TerminalConsole};
use crate::ui::interrupt::Interrupts;
use crate::ui::pages;
use crate::ui::router::{Router, ViewState};

const HELP: &str = "
通用:  /shortcuts  /projects  /settings  /back  /help  /quit
列表:  <编号> 选择   /use <编号>   /new   /open <编号>   /delete [编号]
项目:  直接输入文字发送给 TeacherMind (Ctrl-C 停止生成)
       /qa <编号|名称>          使用快捷操作
       /qa-add 名称 | 提示词     /qa-del <编号>
       /mat-add text|link 标题 | 内容
       /upload <路径>   /toggle <编号>   /mat-del <编号>
       /save [编号] [标题]  保存回复为作品 (默认最近一条)
       /copy [编号]     复制回复的 Markdown
       /work-del <编号>  /export <编号>
设置:  /key <API Key>   /model <编号或名称>
";

/// A user intent parsed from one line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Empty,
    Help,
    Quit,
    ShowShortcuts,
    ShowProjects,
    ShowSettings,
    Back,
    /// A bare number typed in a list view.
    Select(usize),
    UseShortcut(String),
    NewProject,
    OpenProject(String),
    DeleteProject(Option<String>),
    Send(String),
    UseQuickAction(String),
    AddQuickAction { label: String, prompt: String },
    DeleteQuickAction(String),
    AddMaterial { kind: MaterialKind, title: String, content: String },
    Upload(PathBuf),
    ToggleMaterial(String),
    DeleteMaterial(String),
    /// Reply number in the conversation (latest when absent) and title.
    SaveWork { reply: Option<usize>, title: Option<String> },
    CopyReply(Option<usize>),
    DeleteWork(String),
    ExportWork(String),
    SetApiKey(String),
    SetModel(String),
    Unknown(String),
}

impl Command {
    /// Parse a line typed while `view` is showing. Plain text is a chat turn
    /// inside a project and a selection in the list views.
    pub fn parse(line: &str, view: &ViewState) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }

        let Some(command) = line.strip_prefix('/') else {
            return match view {
                ViewState::Project(_) => Self::Send(line.to_string()),
                _ => line
                    .parse::<usize>()
                    .map(Self::Select)
                    .unwrap_or_else(|_| Self::Unknown(line.to_string())),
            };
        };

        let (name, rest) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };
        let arg = || rest.to_string();

        match (name, rest.is_empty()) {
            ("help" | "h" | "?", _) => Self::Help,
            ("quit" | "q" | "exit", _) => Self::Quit,
            ("shortcuts", _) => Self::ShowShortcuts,
            ("projects", _) => Self::ShowProjects,
            ("settings", _) => Self::ShowSettings,
            ("back", _) => Self::Back,
            ("new", _) => Self::NewProject,
            ("delete", empty) => Self::DeleteProject((!empty).then(arg)),
            ("save", _) => {
                let (reply, title) = split_reply_number(rest);
                Self::SaveWork { reply, title }
            }
            ("copy", true) => Self::CopyReply(None),
            ("copy", false) => rest
                .parse()
                .map(|n| Self::CopyReply(Some(n)))
                .unwrap_or_else(|_| Self::Unknown(line.to_string())),
            (_, true) => Self::Unknown(line.to_string()),
            ("use", _) => Self::UseShortcut(arg()),
            ("open", _) => Self::OpenProject(arg()),
            ("qa", _) => Self::UseQuickAction(arg()),
            ("qa-add", _) => match split_pair(rest) {
                Some((label, prompt)) => Self::AddQuickAction { label, prompt },
                None => Self::Unknown(line.to_string()),
            },
            ("qa-del", _) => Self::DeleteQuickAction(arg()),
            ("mat-add", _) => parse_material(rest).unwrap_or_else(|| Self::Unknown(line.to_string())),
            ("upload", _) => Self::Upload(PathBuf::from(unquote(rest))),
            ("toggle", _) => Self::ToggleMaterial(arg()),
            ("mat-del", _) => Self::DeleteMaterial(arg()),
            ("work-del", _) => Self::DeleteWork(arg()),
            ("export", _) => Self::ExportWork(arg()),
            ("key", _) => Self::SetApiKey(arg()),
            ("model", _) => Self::SetModel(arg()),
            _ => Self::Unknown(line.to_string()),
        }
    }
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
        .trim()
}

/// `a | b`, optionally wrapped in quotes.
fn split_pair(s: &str) -> Option<(String, String)> {
    let (a, b) = unquote(s).split_once('|')?;
    Some((a.trim().to_string(), b.trim().to_string()))
}

/// `[number] [title]`: a leading number picks the reply, the rest is the title.
fn split_reply_number(rest: &str) -> (Option<usize>, Option<String>) {
    let non_empty = |s: &str| Some(s.trim()).filter(|s| !s.is_empty()).map(str::to_string);
    let (first, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    match first.parse::<usize>() {
        Ok(number) => (Some(number), non_empty(tail)),
        Err(_) => (None, non_empty(rest)),
    }
}

fn parse_material(rest: &str) -> Option<Command> {
    let (kind, rest) = rest.split_once(char::is_whitespace)?;
    let kind = match kind {
        "text" => MaterialKind::Text,
        "link" => MaterialKind::Link,
        _ => return None,
    };
    let (title, content) = split_pair(rest)?;
    Some(Command::AddMaterial { kind, title, content })
}

/// Find an item by its 1-based list number or by id.
fn pick<'a, T>(items: &'a [T], key: &str, id: impl Fn(&T) -> &str) -> Option<&'a T> {
    let key = key.trim();
    if let Ok(n) = key.parse::<usize>() {
        return items.get(n.checked_sub(1)?);
    }
    items.iter().find(|item| id(item) == key)
}

pub fn pick_shortcut(key: &str) -> Option<&'static Shortcut> {
    pick(SHORTCUTS, key, |s| s.id).or_else(|| find_shortcut(key))
}

/// Whether the loop keeps reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Prints the streaming reply incrementally: snapshots are cumulative, so
/// only the part not yet shown is written.
#[derive(Default)]
struct StreamPrinter {
    /// Echo the user turn; set when the text did not come from the keyboard.
    echo_user: bool,
    printed: usize,
    started: bool,
}

impl StreamPrinter {
    fn echoing_user() -> Self {
        Self {
            echo_user: true,
            ..Self::default()
        }
    }

    fn print_suffix(&mut self, console: &mut dyn Console, text: &str) {
        if let Some(suffix) = text.get(self.printed..) {
            console.print(suffix);
            self.printed = text.len();
        }
    }

    fn handle(&mut self, console: &mut dyn Console, event: SessionEvent<'_>) {
        match event {
            SessionEvent::UserMessage(message) => {
                if self.echo_user {
                    console.print(&pages::project::render_message(message));
                }
            }
            SessionEvent::Streaming(reply) => {
                if !self.started {
                    console.print("\n[TeacherMind]\n");
                    self.started = true;
                }
                self.print_suffix(console, &reply.text);
            }
            SessionEvent::Finished(reply) => {
                self.print_suffix(console, &reply.text);
                console.print("\n");
            }
            SessionEvent::Error(message) => {
                if self.started {
                    console.print("\n");
                }
                console.print(&pages::project::render_message(message));
            }
        }
    }
}

fn system_clipboard(text: &str) -> Result<()> {
    cli_clipboard::set_contents(text.to_string()).map_err(|e| anyhow!("复制失败: {}", e))
}

/// The terminal front end: owns the project store, settings and router, and
/// turns commands into store updates and chat sends.
pub struct TeacherMindApp {
    store: ProjectStore,
    storage: Storage,
    settings: AppSettings,
    router: Router,
    session: ChatSession,
    interrupts: Interrupts,
    export_dir: PathBuf,
    color: bool,
    clipboard: fn(&str) -> Result<()>,
}

impl TeacherMindApp {
    pub fn new(storage: Storage, client: Arc<dyn ChatClient>, prompts: PromptManager, export_dir: PathBuf) -> Self {
        let store = ProjectStore::open(storage.clone());
        let settings = storage.load_settings();
        info!("Loaded {} projects", store.projects().len());

        Self {
            store,
            storage,
            settings,
            router: Router::default(),
            session: ChatSession::new(client, prompts),
            interrupts: Interrupts::default(),
            export_dir,
            color: false,
            clipboard: system_clipboard,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    #[cfg(test)]
    fn with_clipboard(mut self, clipboard: fn(&str) -> Result<()>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Resolve a project by list number or id.
    pub fn find_project(&self, key: &str) -> Option<&Project> {
        pick(self.store.projects(), key, |p| p.id.as_str())
    }

    pub fn open_project(&mut self, key: &str) -> Option<String> {
        let id = self.find_project(key)?.id.clone();
        self.router.open_project(&id);
        Some(id)
    }

    pub fn render_view(&mut self) -> String {
        match self.router.resolve(&self.store).clone() {
            ViewState::Shortcuts => pages::shortcuts::render(SHORTCUTS, self.color),
            ViewState::Projects => pages::projects::render(self.store.projects()),
            ViewState::Project(id) => match self.store.get(&id) {
                Some(project) => pages::project::render(project),
                None => pages::projects::render(self.store.projects()),
            },
        }
    }

    fn prompt(&mut self) -> String {
        let view = self.router.resolve(&self.store).clone();
        match &view {
            ViewState::Project(id) => {
                let title = self.store.get(id).map(|p| p.title.as_str()).unwrap_or_default();
                format!("\n{}> ", title)
            }
            other => format!("\n{}> ", other.title()),
        }
    }

    /// The project shown in the current view, if any.
    fn active_project(&mut self) -> Result<String> {
        match self.router.resolve(&self.store) {
            ViewState::Project(id) => Ok(id.clone()),
            _ => Err(anyhow!("请先打开一个项目 (/open <编号>)")),
        }
    }

    fn modify_active<R>(&mut self, f: impl FnOnce(&mut Project) -> R) -> Result<R> {
        let id = self.active_project()?;
        self.store
            .modify(&id, f)?
            .ok_or_else(|| anyhow!("项目不存在"))
    }

    fn active_item_id<T>(&mut self, key: &str, items: impl Fn(&Project) -> &[T], id: impl Fn(&T) -> &str) -> Result<String> {
        let project_id = self.active_project()?;
        let project = self.store.get(&project_id).ok_or_else(|| anyhow!("项目不存在"))?;
        pick(items(project), key, &id)
            .map(|item| id(item).to_string())
            .ok_or_else(|| anyhow!("找不到: {}", key))
    }

    fn create_from_shortcut(&mut self, key: &str, console: &mut dyn Console) -> Result<()> {
        let shortcut = pick_shortcut(key).ok_or_else(|| anyhow!("找不到快捷指令: {}", key))?;
        let id = self.store.create_from_shortcut(shortcut)?.id.clone();
        self.router.open_project(&id);
        console.print(&self.render_view());
        Ok(())
    }

    /// Send `text` in the active project, printing the reply as it streams.
    /// While interactive, Ctrl-C cancels the request and keeps what has arrived.
    pub async fn send(&mut self, text: &str, console: &mut dyn Console) -> Result<SendOutcome> {
        self.stream_send(text, StreamPrinter::default(), console).await
    }

    async fn stream_send(&mut self, text: &str, mut printer: StreamPrinter, console: &mut dyn Console) -> Result<SendOutcome> {
        let id = self.active_project()?;
        if self.session.is_streaming() {
            console.print("正在生成中，请稍候。\n");
            return Ok(SendOutcome::Busy);
        }

        let cancel = self.interrupts.begin();
        let outcome = self
            .session
            .send(&mut self.store, &id, text, &self.settings, &cancel, |event| {
                printer.handle(console, event)
            })
            .await;
        self.interrupts.end();

        match &outcome {
            SendOutcome::Busy => console.print("正在生成中，请稍候。\n"),
            SendOutcome::Cancelled(_) => console.print("\n(已停止生成)\n"),
            SendOutcome::ProjectMissing => warn!("Project {} vanished during send", id),
            _ => {}
        }
        if let SendOutcome::Completed(reply) | SendOutcome::Cancelled(Some(reply)) = &outcome {
            if let Some(number) = self.reply_number(&id, &reply.id) {
                console.print(&format!("(#{} · /save {} 存为作品 · /copy {} 复制 MD)\n", number, number, number));
            }
        }
        Ok(outcome)
    }

    fn reply_number(&self, project_id: &str, message_id: &str) -> Option<usize> {
        let project = self.store.get(project_id)?;
        let index = project.messages.iter().position(|m| m.id == message_id)?;
        project.messages[index].is_reply().then_some(index + 1)
    }

    /// Text of the chosen reply in the active project.
    fn reply_text(&mut self, number: Option<usize>) -> Result<String> {
        let project = self.current_project()?;
        project.reply(number).map(|m| m.text.clone()).ok_or_else(|| match number {
            Some(n) => anyhow!("第 {} 条不是可以保存或复制的回复", n),
            None => anyhow!("还没有可以保存的回复"),
        })
    }

    async fn save_work(&mut self, reply: Option<usize>, title: Option<String>, console: &mut dyn Console) -> Result<()> {
        let content = self.reply_text(reply)?;

        let title = match title {
            Some(title) => Some(title),
            None => console.ask("请输入作品标题", DEFAULT_WORK_TITLE).await,
        };
        let Some(title) = title else {
            return Ok(());
        };

        let saved = self.modify_active(|p| p.save_work(&title, &content).map(|w| w.title.clone()))?;
        if let Some(saved) = saved {
            console.print(&format!("已保存作品: {}\n", saved));
        }
        Ok(())
    }

    /// Apply one command. Errors are user-facing and leave the app running.
    pub async fn update(&mut self, command: Command, console: &mut dyn Console) -> Result<Flow> {
        match command {
            Command::Empty => {}
            Command::Help => console.print(HELP),
            Command::Quit => return Ok(Flow::Quit),
            Command::ShowShortcuts => {
                self.router.navigate(ViewState::Shortcuts);
                console.print(&self.render_view());
            }
            Command::ShowProjects | Command::Back => {
                self.router.navigate(ViewState::Projects);
                console.print(&self.render_view());
            }
            Command::ShowSettings => console.print(&pages::settings::render(&self.settings)),
            Command::Select(n) => match self.router.resolve(&self.store).clone() {
                ViewState::Shortcuts => self.create_from_shortcut(&n.to_string(), console)?,
                ViewState::Projects => self.update_open(&n.to_string(), console)?,
                ViewState::Project(_) => {}
            },
            Command::UseShortcut(key) => self.create_from_shortcut(&key, console)?,
            Command::NewProject => {
                let id = self.store.create_blank()?.id.clone();
                self.router.open_project(&id);
                console.print(&self.render_view());
            }
            Command::OpenProject(key) => self.update_open(&key, console)?,
            Command::DeleteProject(key) => {
                let id = match key {
                    Some(key) => self
                        .find_project(&key)
                        .map(|p| p.id.clone())
                        .ok_or_else(|| anyhow!("找不到项目: {}", key))?,
                    None => self.active_project()?,
                };
                if console.confirm("确定要删除这个项目吗？").await && self.store.delete(&id)? {
                    self.router.project_deleted(&id);
                    console.print(&self.render_view());
                }
            }
            Command::Send(text) => {
                self.send(&text, console).await?;
            }
            Command::UseQuickAction(key) => {
                let id = self.active_project()?;
                let prompt = self
                    .store
                    .get(&id)
                    .and_then(|p| pick(&p.quick_actions, &key, |a| a.id.as_str()).or_else(|| p.find_quick_action(&key)))
                    .map(|a| a.prompt.clone())
                    .ok_or_else(|| anyhow!("找不到快捷操作: {}", key))?;
                self.stream_send(&prompt, StreamPrinter::echoing_user(), console).await?;
            }
            Command::AddQuickAction { label, prompt } => {
                if self.modify_active(|p| p.add_quick_action(&label, &prompt).is_some())? {
                    console.print(&pages::project::render_quick_actions(self.current_project()?));
                }
            }
            Command::DeleteQuickAction(key) => {
                let id = self.active_item_id(&key, |p| p.quick_actions.as_slice(), |a| a.id.as_str())?;
                if console.confirm("删除这个快捷指令？").await {
                    self.modify_active(|p| p.delete_quick_action(&id))?;
                    console.print(&pages::project::render_quick_actions(self.current_project()?));
                }
            }
            Command::AddMaterial { kind, title, content } => {
                if let Some(material) = Material::manual(kind, &title, &content) {
                    self.modify_active(|p| {
                        p.add_material(material);
                    })?;
                    console.print(&pages::project::render_materials(self.current_project()?));
                }
            }
            Command::Upload(path) => {
                self.active_project()?;
                let material = Material::from_path(&path)?;
                info!("📎 Attached {} ({:?})", material.title, material.kind);
                self.modify_active(|p| {
                    p.add_material(material);
                })?;
                console.print(&pages::project::render_materials(self.current_project()?));
            }
            Command::ToggleMaterial(key) => {
                let id = self.active_item_id(&key, |p| p.materials.as_slice(), |m| m.id.as_str())?;
                self.modify_active(|p| p.toggle_material(&id))?;
                console.print(&pages::project::render_materials(self.current_project()?));
            }
            Command::DeleteMaterial(key) => {
                let id = self.active_item_id(&key, |p| p.materials.as_slice(), |m| m.id.as_str())?;
                if console.confirm("确定删除这份资料吗？").await {
                    self.modify_active(|p| p.delete_material(&id))?;
                    console.print(&pages::project::render_materials(self.current_project()?));
                }
            }
            Command::SaveWork { reply, title } => self.save_work(reply, title, console).await?,
            Command::CopyReply(reply) => {
                let text = self.reply_text(reply)?;
                (self.clipboard)(&text)?;
                info!("📋 Copied {} chars of markdown", text.chars().count());
                console.print("已复制 Markdown 到剪贴板\n");
            }
            Command::DeleteWork(key) => {
                let id = self.active_item_id(&key, |p| p.works.as_slice(), |w| w.id.as_str())?;
                if console.confirm("确定删除这个作品吗？").await {
                    self.modify_active(|p| p.delete_work(&id))?;
                    console.print(&pages::project::render_works(self.current_project()?));
                }
            }
            Command::ExportWork(key) => {
                let id = self.active_item_id(&key, |p| p.works.as_slice(), |w| w.id.as_str())?;
                let path = self.export_work(&id)?;
                console.print(&format!("已导出: {}\n", path.display()));
            }
            Command::SetApiKey(key) => {
                self.settings.api_key = key.trim().to_string();
                self.storage.save_settings(&self.settings)?;
                console.print(&pages::settings::render(&self.settings));
            }
            Command::SetModel(model) => {
                let model = pages::settings::resolve_model(&model).ok_or_else(|| anyhow!("不支持的模型: {}", model))?;
                self.settings.model = model.to_string();
                self.storage.save_settings(&self.settings)?;
                console.print(&pages::settings::render(&self.settings));
            }
            Command::Unknown(line) => console.print(&format!("无法识别: {} (输入 /help 查看命令)\n", line)),
        }
        Ok(Flow::Continue)
    }

    fn update_open(&mut self, key: &str, console: &mut dyn Console) -> Result<()> {
        self.open_project(key).ok_or_else(|| anyhow!("找不到项目: {}", key))?;
        console.print(&self.render_view());
        Ok(())
    }

    fn current_project(&mut self) -> Result<&Project> {
        let id = self.active_project()?;
        self.store.get(&id).ok_or_else(|| anyhow!("项目不存在"))
    }

    /// Write a work of the active project to the export directory.
    pub fn export_work(&mut self, work_id: &str) -> Result<PathBuf> {
        let dir = self.export_dir.clone();
        let project = self.current_project()?;
        let work = project.find_work(work_id).ok_or_else(|| anyhow!("找不到作品"))?;
        work.export_to(&dir)
    }

    /// Read commands until end of input, `/quit`, or Ctrl-C at the prompt.
    pub async fn run(&mut self, console: &mut TerminalConsole) -> Result<()> {
        let listener = self.interrupts.listen();
        console.print(&self.render_view());

        loop {
            let prompt = self.prompt();
            let line = tokio::select! {
                line = console.read_line(&prompt) => line,
                _ = self.interrupts.shutdown().cancelled() => None,
            };
            let Some(line) = line else {
                console.print("\n");
                break;
            };

            let command = Command::parse(&line, self.router.current());
            match self.update(command, console).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => {
                    error!("{:#}", e);
                    console.print(&format!("错误: {}\n", e));
                }
            }
            if self.interrupts.shutdown().is_cancelled() {
                break;
            }
        }

        listener.abort();
        info!("👋 Goodbye");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{Script, ScriptedClient};
    use crate::project::Role;
    use crate::storage::{FileStore, MemoryStore};
    use crate::ui::dialogs::ScriptedConsole;
    use std::cell::RefCell;

    thread_local! {
        static CLIPBOARD: RefCell<Option<String>> = const { RefCell::new(None) };
    }

    fn recording_clipboard(text: &str) -> Result<()> {
        CLIPBOARD.with(|c| *c.borrow_mut() = Some(text.to_string()));
        Ok(())
    }

    fn app_with(client: ScriptedClient) -> (Arc<ScriptedClient>, TeacherMindApp) {
        let client = Arc::new(client);
        let storage = Storage::new(Arc::new(MemoryStore::new()));
        let mut app = TeacherMindApp::new(
            storage,
            client.clone(),
            PromptManager::default(),
            std::env::temp_dir(),
        )
        .with_clipboard(recording_clipboard);
        app.settings.api_key = "test-key".to_string();
        (client, app)
    }

    async fn run(app: &mut TeacherMindApp, console: &mut ScriptedConsole, line: &str) -> Flow {
        let command = Command::parse(line, app.router().current());
        app.update(command, console).await.unwrap()
    }

    fn active(app: &TeacherMindApp) -> &Project {
        app.store.get(app.router().active_project_id().unwrap()).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        let list = ViewState::Projects;
        let project = ViewState::Project("p".to_string());

        assert_eq!(Command::parse("  ", &list), Command::Empty);
        assert_eq!(Command::parse("2", &list), Command::Select(2));
        assert_eq!(Command::parse("2", &project), Command::Send("2".to_string()));
        assert_eq!(Command::parse("hello", &list), Command::Unknown("hello".to_string()));
        assert_eq!(Command::parse("/delete", &project), Command::DeleteProject(None));
        assert_eq!(Command::parse("/delete 3", &list), Command::DeleteProject(Some("3".to_string())));
        assert_eq!(Command::parse("/save", &project), Command::SaveWork { reply: None, title: None });
        assert_eq!(
            Command::parse("/save 4 第一课", &project),
            Command::SaveWork { reply: Some(4), title: Some("第一课".to_string()) }
        );
        assert_eq!(
            Command::parse("/save 分数/小数", &project),
            Command::SaveWork { reply: None, title: Some("分数/小数".to_string()) }
        );
        assert_eq!(Command::parse("/copy", &project), Command::CopyReply(None));
        assert_eq!(Command::parse("/copy 2", &project), Command::CopyReply(Some(2)));
        assert_eq!(Command::parse("/copy all", &project), Command::Unknown("/copy all".to_string()));
        assert_eq!(Command::parse("/open", &list), Command::Unknown("/open".to_string()));
        assert_eq!(
            Command::parse("/qa-add \"总结 | 请总结上述内容\"", &project),
            Command::AddQuickAction {
                label: "总结".to_string(),
                prompt: "请总结上述内容".to_string()
            }
        );
        assert_eq!(
            Command::parse("/mat-add link Video | https://example.com/a|b", &project),
            Command::AddMaterial {
                kind: MaterialKind::Link,
                title: "Video".to_string(),
                content: "https://example.com/a|b".to_string()
            }
        );
        assert!(matches!(Command::parse("/mat-add image x | y", &project), Command::Unknown(_)));
        assert_eq!(Command::parse("/upload \"my notes.pdf\"", &project), Command::Upload(PathBuf::from("my notes.pdf")));
    }

    #[test]
    fn test_pick_by_number_or_id() {
        assert_eq!(pick_shortcut("2").unwrap().id, "rubric-design");
        assert_eq!(pick_shortcut("lesson-plan").unwrap().id, "lesson-plan");
        assert!(pick_shortcut("0").is_none());
        assert!(pick_shortcut("99").is_none());
    }

    #[tokio::test]
    async fn test_shortcut_creates_and_opens_project() {
        let (client, mut app) = app_with(ScriptedClient::default());
        let mut console = ScriptedConsole::default();

        run(&mut app, &mut console, "2").await;

        let project = active(&app);
        assert_eq!(project.title, "评价量规设计");
        assert_eq!(project.messages.len(), 1);
        assert_eq!(project.messages[0].role, Role::User);
        assert_eq!(client.call_count(), 0);
        assert!(console.take_output().contains("== 评价量规设计 =="));
    }

    #[tokio::test]
    async fn test_chat_quick_action_and_save_work() {
        let (client, mut app) = app_with(ScriptedClient::new(vec![
            Script::Reply(vec!["## 目标", "\n- 理解分数"]),
            Script::Reply(vec!["更专业的版本"]),
        ]));
        let mut console = ScriptedConsole::answering(&[""]);

        run(&mut app, &mut console, "/new").await;
        run(&mut app, &mut console, "帮我设计教学目标").await;
        let output = console.take_output();
        assert!(output.contains("[TeacherMind]\n## 目标\n- 理解分数\n"));

        run(&mut app, &mut console, "/qa 润色").await;
        assert_eq!(client.call_count(), 2);
        assert_eq!(client.requests()[1].1.message, "请润色上述内容，使其语言更加专业、学术，符合教学设计的规范。");

        run(&mut app, &mut console, "/save").await;
        let project = active(&app);
        assert_eq!(project.messages.len(), 4);
        assert_eq!(project.works.len(), 1);
        assert_eq!(project.works[0].title, DEFAULT_WORK_TITLE);
        assert_eq!(project.works[0].content, "更专业的版本");
    }

    #[tokio::test]
    async fn test_failed_send_does_not_hide_earlier_reply() {
        let (client, mut app) = app_with(ScriptedClient::new(vec![
            Script::Reply(vec!["Real lesson plan"]),
            Script::Reject("quota exceeded"),
            Script::Reply(vec!["Next"]),
        ]));
        let mut console = ScriptedConsole::default();

        run(&mut app, &mut console, "/new").await;
        run(&mut app, &mut console, "first").await;
        assert!(console.take_output().contains("(#2 · /save 2 存为作品 · /copy 2 复制 MD)"));
        run(&mut app, &mut console, "second").await;
        let output = console.take_output();
        assert!(output.contains("[TeacherMind · 错误]\nError: API error: quota exceeded"));
        assert!(active(&app).messages[3].is_error);

        run(&mut app, &mut console, "/save Lesson A").await;
        run(&mut app, &mut console, "/save 2 Lesson B").await;
        let works = &active(&app).works;
        assert_eq!(works.len(), 2);
        assert_eq!(works[0].title, "Lesson A");
        assert_eq!(works[0].content, "Real lesson plan");
        assert_eq!(works[1].title, "Lesson B");
        assert_eq!(works[1].content, "Real lesson plan");

        let command = Command::parse("/save 4 Broken", app.router().current());
        assert!(app.update(command, &mut console).await.is_err());
        let command = Command::parse("/save 1 Question", app.router().current());
        assert!(app.update(command, &mut console).await.is_err());
        assert_eq!(active(&app).works.len(), 2);

        run(&mut app, &mut console, "third").await;
        let history: Vec<String> = client.requests()[2].1.history.iter().map(|t| t.text.clone()).collect();
        assert_eq!(history, vec!["first", "Real lesson plan", "second"]);
    }

    #[tokio::test]
    async fn test_copy_reply_as_markdown() {
        let (_client, mut app) = app_with(ScriptedClient::new(vec![
            Script::Reply(vec!["# 教案", "\n- 目标"]),
            Script::Reply(vec!["## 量规"]),
        ]));
        let mut console = ScriptedConsole::default();

        run(&mut app, &mut console, "/new").await;
        let command = Command::parse("/copy", app.router().current());
        assert!(app.update(command, &mut console).await.is_err());

        run(&mut app, &mut console, "写一份教案").await;
        run(&mut app, &mut console, "再写量规").await;
        console.take_output();

        run(&mut app, &mut console, "/copy").await;
        assert_eq!(CLIPBOARD.with(|c| c.borrow().clone()).as_deref(), Some("## 量规"));
        run(&mut app, &mut console, "/copy 2").await;
        assert_eq!(CLIPBOARD.with(|c| c.borrow().clone()).as_deref(), Some("# 教案\n- 目标"));
        assert!(console.take_output().contains("已复制"));

        let command = Command::parse("/copy 3", app.router().current());
        assert!(app.update(command, &mut console).await.is_err());
    }

    #[tokio::test]
    async fn test_save_without_reply_is_an_error() {
        let (_client, mut app) = app_with(ScriptedClient::default());
        let mut console = ScriptedConsole::default();

        run(&mut app, &mut console, "/new").await;
        let command = Command::parse("/save Lesson A", app.router().current());
        assert!(app.update(command, &mut console).await.is_err());
    }

    #[tokio::test]
    async fn test_materials_commands() {
        let (client, mut app) = app_with(ScriptedClient::default());
        let mut console = ScriptedConsole::answering(&["n", "y"]);

        run(&mut app, &mut console, "/new").await;
        run(&mut app, &mut console, "/mat-add text Syllabus | Week 1 photosynthesis").await;
        run(&mut app, &mut console, "/mat-add text  | no title").await;
        assert_eq!(active(&app).materials.len(), 1);

        run(&mut app, &mut console, "/toggle 1").await;
        assert!(!active(&app).materials[0].is_active);

        run(&mut app, &mut console, "hi").await;
        assert!(!client.requests()[0].1.system_instruction.contains("Syllabus"));

        run(&mut app, &mut console, "/mat-del 1").await;
        assert_eq!(active(&app).materials.len(), 1);
        run(&mut app, &mut console, "/mat-del 1").await;
        assert!(active(&app).materials.is_empty());
    }

    #[tokio::test]
    async fn test_delete_active_project_returns_to_list() {
        let (_client, mut app) = app_with(ScriptedClient::default());
        let mut console = ScriptedConsole::answering(&["y"]);

        run(&mut app, &mut console, "/new").await;
        let id = app.router().active_project_id().unwrap().to_string();
        run(&mut app, &mut console, "/delete").await;

        assert!(!app.store.contains(&id));
        assert_eq!(app.router().current(), &ViewState::Projects);
        assert!(console.take_output().contains("还没有项目"));
    }

    #[tokio::test]
    async fn test_declined_delete_keeps_project() {
        let (_client, mut app) = app_with(ScriptedClient::default());
        let mut console = ScriptedConsole::answering(&["n"]);

        run(&mut app, &mut console, "/new").await;
        run(&mut app, &mut console, "/projects").await;
        run(&mut app, &mut console, "/delete 1").await;
        assert_eq!(app.store.projects().len(), 1);
    }

    #[tokio::test]
    async fn test_settings_commands_persist() {
        let (_client, mut app) = app_with(ScriptedClient::default());
        let mut console = ScriptedConsole::default();

        run(&mut app, &mut console, "/key AIzaSyABCDEF").await;
        run(&mut app, &mut console, "/model 2").await;

        assert_eq!(app.storage.load_settings().api_key, "AIzaSyABCDEF");
        assert_eq!(app.storage.load_settings().model, "gemini-1.5-pro");
        assert!(console.take_output().contains("AIz...DEF"));

        let command = Command::parse("/model gpt-4", app.router().current());
        assert!(app.update(command, &mut console).await.is_err());
        assert_eq!(app.settings.model, "gemini-1.5-pro");
    }

    #[tokio::test]
    async fn test_export_writes_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(ScriptedClient::replying(vec!["# 教案"]));
        let storage = Storage::new(Arc::new(FileStore::new(dir.path().join("data")).unwrap()));
        let mut app = TeacherMindApp::new(storage, client, PromptManager::default(), dir.path().join("out"));
        app.settings.api_key = "test-key".to_string();
        let mut console = ScriptedConsole::default();

        run(&mut app, &mut console, "/new").await;
        run(&mut app, &mut console, "写一份教案").await;
        run(&mut app, &mut console, "/save 分数/小数").await;
        run(&mut app, &mut console, "/export 1").await;

        let exported = std::fs::read_to_string(dir.path().join("out").join("分数_小数.md")).unwrap();
        assert_eq!(exported, "# 教案");
    }

    #[tokio::test]
    async fn test_quit() {
        let (_client, mut app) = app_with(ScriptedClient::default());
        let mut console = ScriptedConsole::default();
        assert_eq!(run(&mut app, &mut console, "/quit").await, Flow::Quit);
    }
}
