use crate::chart::GrowthChart;
use crate::grass::render_grass_svg;
use crate::models::Calendar;

/// Page shell. The placeholder grid and an empty chart are inlined so the
/// page has a renderable grid before the first query completes.
pub fn render_index(chart_height: f64) -> String {
    let placeholder = Calendar::placeholder();
    let chart = GrowthChart::new(chart_height);
    INDEX_HTML
        .replace("{{GRASS}}", &render_grass_svg(&placeholder, &[]))
        .replace("{{CHART}}", &chart.render())
        .replace("{{LATEST}}", &chart.summary().latest)
        .replace("{{CHART_HEIGHT}}", &chart.height().to_string())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>GitHub Contributions</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #f3f6f4;
      --bg-2: #cfe8d5;
      --ink: #24292f;
      --accent: #216e39;
      --muted: #6b7280;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 24px 60px rgba(33, 110, 57, 0.14);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #e8f3ea 60%, #f6f8f7 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(820px, 95%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(2rem, 4vw, 2.6rem);
      margin: 0;
    }

    input {
      width: 100%;
      border: 1px solid rgba(36, 41, 47, 0.18);
      border-radius: 999px;
      padding: 12px 18px;
      font: inherit;
      font-size: 1rem;
    }

    .card {
      background: white;
      border-radius: 20px;
      padding: 16px;
      border: 1px solid rgba(36, 41, 47, 0.08);
      display: grid;
      gap: 12px;
    }

    .card h2 {
      margin: 0;
      font-size: 1.1rem;
    }

    .grass-scroll {
      overflow-x: auto;
    }

    .grass-label {
      fill: var(--muted);
      font-size: 9px;
    }

    .month-separators line {
      stroke: rgba(36, 41, 47, 0.2);
    }

    .chart-header {
      display: flex;
      align-items: flex-start;
      justify-content: space-between;
      gap: 16px;
    }

    .chart-readout {
      display: flex;
      flex-direction: column;
      align-items: flex-end;
    }

    .badge {
      background: rgba(33, 110, 57, 0.1);
      color: var(--accent);
      border-radius: 999px;
      padding: 4px 12px;
      font-weight: 600;
    }

    .latest-date {
      color: var(--muted);
      margin-top: 2px;
    }

    #chart svg {
      width: 100%;
      height: auto;
      display: block;
    }

    .chart-line {
      stroke: var(--accent);
      stroke-width: 2;
    }

    .chart-points circle {
      fill: white;
      stroke: var(--accent);
      stroke-width: 1.5;
    }

    .chart-grid line {
      stroke: rgba(36, 41, 47, 0.08);
    }

    .chart-axis {
      stroke: rgba(36, 41, 47, 0.35);
      stroke-dasharray: 4 4;
    }

    .chart-label {
      fill: var(--muted);
      font-size: 10px;
    }

    .status {
      font-size: 0.95rem;
      color: var(--muted);
      min-height: 1.2em;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    @media (max-width: 600px) {
      .app {
        padding: 28px 22px;
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>GitHub Contributions</h1>
    </header>

    <input id="username" type="text" placeholder="GitHub username" autocomplete="off" />
    <div class="status" id="status" data-type="prompt">Enter a GitHub username</div>

    <section class="card">
      <h2 id="grass-title"></h2>
      <div class="grass-scroll" id="grass">{{GRASS}}</div>
    </section>

    <section class="card" id="chart-card">
      <div class="chart-header">
        <h2>Weekly growth</h2>
        <div class="chart-readout">
          <span class="badge" id="latest" aria-label="Change from previous week">{{LATEST}}</span>
          <small class="latest-date" id="latest-date"></small>
        </div>
      </div>
      <div id="chart">{{CHART}}</div>
    </section>
  </main>

  <script>
    const CHART_HEIGHT = {{CHART_HEIGHT}};
    const MIN_WIDTH = 280;
    const SESSION = (window.crypto && crypto.randomUUID)
      ? crypto.randomUUID()
      : `${Date.now().toString(36)}-${Math.random().toString(36).slice(2)}`;

    const inputEl = document.getElementById('username');
    const statusEl = document.getElementById('status');
    const grassEl = document.getElementById('grass');
    const grassTitleEl = document.getElementById('grass-title');
    const chartEl = document.getElementById('chart');
    const latestEl = document.getElementById('latest');
    const latestDateEl = document.getElementById('latest-date');

    let currentUser = '';
    let querySeq = 0;
    let resizeSeq = 0;
    let chartWidth = Math.max(MIN_WIDTH, Math.floor(chartEl.getBoundingClientRect().width));
    let debounce = null;

    const setStatus = (message, type) => {
      statusEl.textContent = message || '';
      statusEl.dataset.type = type || '';
    };

    const params = (username, width) =>
      `username=${encodeURIComponent(username)}&width=${width}&height=${CHART_HEIGHT}`;

    const renderView = (view) => {
      grassEl.innerHTML = view.grass_svg;
      chartEl.innerHTML = view.chart_svg;
      latestEl.textContent = view.summary.latest;
      latestDateEl.textContent = view.summary.latest_date ? `Latest data: ${view.summary.latest_date}` : '';
      grassTitleEl.textContent = view.query_key && view.status.kind === 'ok'
        ? `${view.query_key}: ${view.total} contributions`
        : '';
      setStatus(view.status.message, view.status.kind);
    };

    const load = async (username) => {
      const id = ++querySeq;
      currentUser = username;
      if (username) {
        setStatus('Loading...', 'info');
      }
      try {
        const res = await fetch(`/api/view?${params(username, chartWidth)}&session=${SESSION}`);
        if (id !== querySeq) {
          return;
        }
        if (!res.ok) {
          throw new Error((await res.text()) || 'Request failed');
        }
        const view = await res.json();
        if (id !== querySeq || view.stale) {
          return;
        }
        renderView(view);
      } catch (err) {
        if (id === querySeq) {
          setStatus(err.message, 'error');
        }
      }
    };

    const redrawChart = async (width) => {
      const id = ++resizeSeq;
      const user = currentUser;
      const res = await fetch(`/api/growth-chart?${params(user, width)}`);
      if (!res.ok) {
        return;
      }
      const svg = await res.text();
      if (id === resizeSeq && user === currentUser) {
        chartEl.innerHTML = svg;
      }
    };

    new ResizeObserver((entries) => {
      const width = Math.max(MIN_WIDTH, Math.floor(entries[0].contentRect.width));
      if (width === chartWidth) {
        return;
      }
      chartWidth = width;
      redrawChart(width).catch(() => {});
    }).observe(chartEl);

    inputEl.addEventListener('input', () => {
      clearTimeout(debounce);
      debounce = setTimeout(() => load(inputEl.value.trim()), 300);
    });

    load('');
  </script>
</body>
</html>
"#;
