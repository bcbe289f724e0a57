use axum::response::Html;

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>PoemSnap</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: linear-gradient(135deg, #f6d5f7 0%, #fbe9d7 100%);
            min-height: 100vh;
            display: flex;
            justify-content: center;
            padding: 40px 20px;
        }

        .container {
            background: white;
            border-radius: 20px;
            box-shadow: 0 20px 60px rgba(0,0,0,0.15);
            max-width: 900px;
            width: 100%;
            padding: 40px;
        }

        h1 { color: #6b3fa0; font-size: 2.6em; text-align: center; }
        .subtitle { color: #777; text-align: center; margin: 8px 0 30px; }

        .upload-area {
            border: 3px dashed #b07cd8;
            border-radius: 15px;
            padding: 50px 20px;
            text-align: center;
            cursor: pointer;
            background: #fbf7ff;
        }
        .upload-area.dragover { background: #f1e6ff; }
        .upload-area.disabled { opacity: 0.5; pointer-events: none; }
        .upload-text { color: #6b3fa0; font-size: 1.2em; font-weight: 600; }
        .upload-hint { color: #999; font-size: 0.9em; margin-top: 8px; }
        input[type="file"] { display: none; }

        .panel { margin-top: 30px; display: none; }
        .loading { text-align: center; padding: 30px; }
        .spinner {
            border: 4px solid #eee;
            border-top: 4px solid #b07cd8;
            border-radius: 50%;
            width: 44px;
            height: 44px;
            animation: spin 1s linear infinite;
            margin: 0 auto 16px;
        }
        @keyframes spin { 0% { transform: rotate(0deg); } 100% { transform: rotate(360deg); } }

        .error {
            background: #fee;
            border: 2px solid #fcc;
            color: #c33;
            padding: 15px;
            border-radius: 10px;
        }

        .result { display: grid; grid-template-columns: 1fr 1fr; gap: 24px; }
        .result h2 { color: #555; font-size: 1.2em; text-align: center; margin-bottom: 12px; }
        .result img { width: 100%; border-radius: 10px; }
        .poem { white-space: pre-line; line-height: 1.7; background: #f6effc; padding: 18px; border-radius: 10px; }

        .actions { margin-top: 24px; display: flex; gap: 10px; justify-content: center; flex-wrap: wrap; }
        .actions button {
            background: #fbf7ff;
            color: #6b3fa0;
            border: 2px solid #b07cd8;
            border-radius: 20px;
            padding: 8px 16px;
            font-weight: 600;
            cursor: pointer;
        }

        .toast {
            position: fixed;
            bottom: 24px;
            right: 24px;
            background: #333;
            color: white;
            padding: 12px 18px;
            border-radius: 10px;
            display: none;
        }
        .toast.failure { background: #c33; }
    </style>
</head>
<body>
    <div class="container">
        <h1>PoemSnap</h1>
        <p class="subtitle">Transform your photos into captivating poetry with the magic of AI.</p>

        <div class="upload-area" id="uploadArea">
            <div class="upload-text">Click or drag a photo here</div>
            <div class="upload-hint">JPG, PNG, GIF, WebP &bull; Max 10MB</div>
            <input type="file" id="fileInput" accept="image/*">
        </div>

        <div class="panel loading" id="loading">
            <div class="spinner"></div>
            <p id="loadingText"></p>
        </div>

        <div class="panel error" id="error"></div>

        <div class="panel" id="resultPanel">
            <div class="result">
                <div><h2 id="photoTitle"></h2><img id="photo" alt="Uploaded inspiration"></div>
                <div><h2 id="poemTitle"></h2><div class="poem" id="poem" aria-label="Generated poem"></div></div>
            </div>
            <div class="actions">
                <button id="savePoem">Save Poem</button>
                <button id="saveImage">Save Image</button>
                <button id="share">Share Creation</button>
                <button id="copy">Copy Poem</button>
            </div>
        </div>
    </div>

    <div class="toast" id="toast"></div>

    <script>
        const $ = (id) => document.getElementById(id);
        let sessionId = null;

        function toast(title, description, failed) {
            const el = $('toast');
            el.textContent = title + ' ' + description;
            el.classList.toggle('failure', !!failed);
            el.style.display = 'block';
            setTimeout(() => { el.style.display = 'none'; }, 4000);
        }

        function render(view) {
            ['loading', 'error', 'resultPanel'].forEach(id => $(id).style.display = 'none');
            $('uploadArea').classList.toggle('disabled', view.status === 'loading');

            if (view.status === 'loading') {
                $('loadingText').textContent = view.message + ' ' + view.hint;
                $('loading').style.display = 'block';
            } else if (view.status === 'error') {
                $('error').textContent = view.title + ': ' + view.message;
                $('error').style.display = 'block';
            } else if (view.status === 'success') {
                $('photoTitle').textContent = view.photoTitle;
                $('photo').src = view.imageSrc;
                $('poemTitle').textContent = view.poemTitle;
                $('poem').textContent = view.poem;
                $('resultPanel').style.display = 'block';
            }
        }

        async function ensureSession() {
            if (sessionId) return sessionId;
            const response = await fetch('/api/sessions', { method: 'POST' });
            const created = await response.json();
            sessionId = created.sessionId;
            render(created.view);
            return sessionId;
        }

        async function handleFile(file) {
            if (!file.type.startsWith('image/')) {
                render({ status: 'error', title: 'An Error Occurred', message: 'Please upload a valid image file (e.g., JPG, PNG, GIF).' });
                return;
            }
            const id = await ensureSession();
            render({ status: 'loading', message: 'Crafting your poem... please wait.', hint: 'This may take a few moments.' });

            const formData = new FormData();
            formData.append('image', file);
            try {
                const response = await fetch(`/api/sessions/${id}/upload`, { method: 'POST', body: formData });
                const body = await response.json();
                if (!response.ok) {
                    render({ status: 'error', title: 'An Error Occurred', message: body.error });
                } else if (!body.superseded) {
                    render(body.view);
                }
            } catch (error) {
                render({ status: 'error', title: 'An Error Occurred', message: error.message });
            }
        }

        async function download(kind) {
            const response = await fetch(`/api/sessions/${sessionId}/export/${kind}`);
            if (!response.ok) {
                const body = await response.json();
                const note = body.notification || { title: 'Save Failed', description: body.error };
                toast(note.title, note.description, true);
                return;
            }
            const disposition = response.headers.get('content-disposition') || '';
            const match = disposition.match(/filename="([^"]+)"/);
            const url = URL.createObjectURL(await response.blob());
            const link = document.createElement('a');
            link.href = url;
            link.download = match ? match[1] : kind;
            document.body.appendChild(link);
            link.click();
            document.body.removeChild(link);
            URL.revokeObjectURL(url);
            toast(kind === 'poem' ? 'Poem Saved' : 'Image Saved', response.headers.get('x-poem-notice') || '');
        }

        function capabilities() {
            const share = typeof navigator.share === 'function';
            let shareFiles = false;
            if (share && typeof navigator.canShare === 'function') {
                try {
                    const sample = new File([''], 'poem_snap_image.png', { type: 'image/png' });
                    shareFiles = navigator.canShare({ files: [sample] });
                } catch (error) {
                    shareFiles = false;
                }
            }
            return { share, shareFiles };
        }

        async function attempt(plan, step) {
            if (step.method === 'text_and_image') {
                const response = await fetch(plan.image.url);
                if (!response.ok) throw new Error('image unavailable');
                const file = new File([await response.blob()], plan.image.name, { type: plan.image.mimeType });
                await navigator.share({ title: plan.title, text: plan.text, files: [file] });
            } else if (step.method === 'text_only') {
                await navigator.share({ title: plan.title, text: plan.text });
            } else {
                await navigator.clipboard.writeText(plan.poem);
            }
        }

        async function runPlan(path, payload) {
            const response = await fetch(`/api/sessions/${sessionId}/${path}`, {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify(payload),
            });
            const plan = await response.json();
            if (!response.ok) {
                toast('Failed', plan.error, true);
                return;
            }
            for (const step of plan.steps) {
                try {
                    await attempt(plan, step);
                    const note = step.onSuccess;
                    toast(note.title, note.description, false);
                    return;
                } catch (error) {
                    console.warn(`${step.method} failed`, error);
                }
            }
            toast(plan.onFailure.title, plan.onFailure.description, true);
        }

        const uploadArea = $('uploadArea');
        uploadArea.addEventListener('click', () => $('fileInput').click());
        uploadArea.addEventListener('dragover', (e) => { e.preventDefault(); uploadArea.classList.add('dragover'); });
        uploadArea.addEventListener('dragleave', () => uploadArea.classList.remove('dragover'));
        uploadArea.addEventListener('drop', (e) => {
            e.preventDefault();
            uploadArea.classList.remove('dragover');
            const file = e.dataTransfer.files[0];
            if (file) handleFile(file);
        });
        $('fileInput').addEventListener('change', (e) => {
            const file = e.target.files[0];
            if (file) handleFile(file);
            e.target.value = '';
        });

        $('savePoem').addEventListener('click', () => download('poem'));
        $('saveImage').addEventListener('click', () => download('image'));
        $('share').addEventListener('click', () => runPlan('share', capabilities()));
        $('copy').addEventListener('click', () => runPlan('copy', {}));

        ensureSession();
    </script>
</body>
</html>
"#;
